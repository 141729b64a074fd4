use url::Url;

use crate::error::LinkRejection;
use crate::parser::extract::links::is_origin_host;

const ABSENT_MARKERS: &[&str] = &["none", "n/a", "na", "null", "no link", "-"];

/// Validate the optional recommendation link. `Ok(None)` when the service
/// said there is no link.
pub fn validate(raw: Option<&str>, origin: &Url) -> Result<Option<String>, LinkRejection> {
    let Some(raw) = raw.map(|r| r.trim().trim_matches(|c: char| c == '<' || c == '>')) else {
        return Ok(None);
    };
    if raw.is_empty() || ABSENT_MARKERS.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }

    if raw.starts_with('/') && !raw.starts_with("//") {
        return Err(LinkRejection::OriginSite(raw.to_string()));
    }
    let url = Url::parse(raw).map_err(|_| LinkRejection::Malformed(raw.to_string()))?;
    let Some(host) = url.host_str() else {
        return Err(LinkRejection::Malformed(raw.to_string()));
    };
    if is_origin_host(host, origin) {
        return Err(LinkRejection::OriginSite(raw.to_string()));
    }
    Ok(Some(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://www.theguardian.com").unwrap()
    }

    #[test]
    fn accepts_external_absolute_url() {
        assert_eq!(
            validate(Some("https://mubi.com/films/aftersun"), &origin()),
            Ok(Some("https://mubi.com/films/aftersun".to_string()))
        );
        assert_eq!(
            validate(Some("<https://mubi.com/a>"), &origin()),
            Ok(Some("https://mubi.com/a".to_string()))
        );
    }

    #[test]
    fn rejects_origin_links() {
        for raw in [
            "https://www.theguardian.com/film/x",
            "http://theguardian.com/x",
            "/culture/x",
        ] {
            assert!(
                matches!(validate(Some(raw), &origin()), Err(LinkRejection::OriginSite(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn rejects_malformed_links() {
        for raw in ["mubi.com/films", "not a url", "mailto:someone@mubi.com"] {
            assert!(
                matches!(validate(Some(raw), &origin()), Err(LinkRejection::Malformed(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn absent_markers_mean_no_link() {
        assert_eq!(validate(None, &origin()), Ok(None));
        assert_eq!(validate(Some("None"), &origin()), Ok(None));
        assert_eq!(validate(Some("N/A"), &origin()), Ok(None));
    }
}
