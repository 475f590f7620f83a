//! Normalizes raw package-manager output into `name-version` strings.
//!
//! Listing formats vary by distribution family:
//! - apt: `package/distribution version architecture [status]`
//! - dnf: `package.arch version repo`
//! - apk: `package-version`
//!
//! All of them are reduced to `package-version` so the same component
//! name yields the same CPE regardless of where it was collected.

use tracing::debug;

/// Sanitizes a raw package listing into component names.
///
/// Empty lines, header lines ("Listing..."), and entries that do not
/// start with an alphanumeric, dash, or underscore are dropped.
pub fn sanitize_package_listing(raw: &str) -> Vec<String> {
    let total_lines = raw.lines().count();
    let mut sanitized = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.to_lowercase().contains("listing") {
            continue;
        }

        let mut pkg = if trimmed.contains('/') {
            sanitize_apt_line(trimmed)
        } else if trimmed.contains(' ') {
            sanitize_dnf_line(trimmed)
        } else {
            trimmed.to_string()
        };

        // Strip trailing metadata such as "[installed]".
        if let Some(bracket) = pkg.find('[') {
            pkg = pkg[..bracket].trim().to_string();
        }
        let pkg = pkg.trim_end_matches('-').trim();

        let keeps = pkg
            .chars()
            .next()
            .map(|c| c.is_alphanumeric() || c == '-' || c == '_')
            .unwrap_or(false);
        if keeps {
            sanitized.push(pkg.to_string());
        }
    }

    debug!(
        kept = sanitized.len(),
        raw_lines = total_lines,
        "sanitized package listing"
    );
    sanitized
}

/// apt format: `name/distro version arch [status]` becomes `name-version`.
fn sanitize_apt_line(line: &str) -> String {
    let name = line.split('/').next().unwrap_or("").trim();
    let version = line.split_whitespace().nth(1).unwrap_or("").trim();
    if version.is_empty() || version == "[installed]" || version == "[upgradable]" {
        name.to_string()
    } else {
        format!("{name}-{version}")
    }
}

/// dnf format: `name.arch version repo` becomes `name-version`,
/// with the architecture suffix stripped from the name.
fn sanitize_dnf_line(line: &str) -> String {
    let mut parts = line.split_whitespace();
    let Some(raw_name) = parts.next() else {
        return String::new();
    };
    let Some(version) = parts.next() else {
        return raw_name.to_string();
    };

    let name = if raw_name.contains('.') && !raw_name.starts_with('.') {
        raw_name.rsplit_once('.').map(|(n, _)| n).unwrap_or(raw_name)
    } else {
        raw_name
    };
    format!("{name}-{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apt_listing() {
        let raw = "Listing... Done\n\
                   curl/jammy-updates,now 7.81.0-1ubuntu1.15 amd64 [installed]\n\
                   openssl/jammy-updates 3.0.2-0ubuntu1.12 amd64\n";
        let result = sanitize_package_listing(raw);
        assert_eq!(
            result,
            vec![
                "curl-7.81.0-1ubuntu1.15".to_string(),
                "openssl-3.0.2-0ubuntu1.12".to_string(),
            ]
        );
    }

    #[test]
    fn test_apt_line_without_version_keeps_bare_name() {
        let result = sanitize_package_listing("nano/stable\n");
        assert_eq!(result, vec!["nano".to_string()]);
    }

    #[test]
    fn test_dnf_listing_strips_arch_suffix() {
        let raw = "Installed Packages\n\
                   bash.x86_64 5.2.26-1.fc40 @anaconda\n\
                   tzdata.noarch 2024a-5.fc40 @anaconda\n";
        let result = sanitize_package_listing(raw);
        assert_eq!(
            result,
            vec!["bash-5.2.26-1.fc40".to_string(), "tzdata-2024a-5.fc40".to_string()]
        );
    }

    #[test]
    fn test_apk_listing_passes_through() {
        let raw = "musl-1.2.4-r2\nbusybox-1.36.1-r15\n";
        let result = sanitize_package_listing(raw);
        assert_eq!(
            result,
            vec!["musl-1.2.4-r2".to_string(), "busybox-1.36.1-r15".to_string()]
        );
    }

    #[test]
    fn test_bracket_metadata_removed() {
        let result = sanitize_package_listing("vim-9.0.1[installed]\n");
        assert_eq!(result, vec!["vim-9.0.1".to_string()]);
    }

    #[test]
    fn test_trailing_dash_trimmed() {
        let result = sanitize_package_listing("weird-\n");
        assert_eq!(result, vec!["weird".to_string()]);
    }

    #[test]
    fn test_invalid_leading_characters_dropped() {
        let raw = "#comment\n.hidden 1.0\n=broken\n_ok-2.0\n";
        let result = sanitize_package_listing(raw);
        assert_eq!(result, vec!["_ok-2.0".to_string()]);
    }

    #[test]
    fn test_empty_and_header_lines_skipped() {
        let raw = "\n   \nListing... Done\n";
        assert!(sanitize_package_listing(raw).is_empty());
    }

    #[test]
    fn test_sanitization_is_deterministic() {
        let raw = "curl/jammy 7.81.0 amd64\nbash.x86_64 5.2.26 @anaconda\n";
        assert_eq!(
            sanitize_package_listing(raw),
            sanitize_package_listing(raw)
        );
    }
}
