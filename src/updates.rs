/// New-release check against the project's GitHub releases
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub const GITHUB_REPO: &str = "kaitas/tabCleaner";

/// The fields of GitHub's `releases/latest` response we use
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub has_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Compare dotted version strings part by part.
///
/// A leading `v` is ignored. Missing parts and parts that are not numbers count as 0,
/// so "1.2" == "1.2.0" and "1.x" == "1.0".
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = version_parts(a);
    let b = version_parts(b);

    for i in 0..a.len().max(b.len()) {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

pub fn is_newer(latest: &str, current: &str) -> bool {
    compare_versions(latest, current) == Ordering::Greater
}

fn version_parts(version: &str) -> Vec<u64> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    version
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

/// Whether `release` is ahead of the running `current_version`
pub fn update_status(release: &Release, current_version: &str) -> UpdateStatus {
    let latest = release.tag_name.trim();
    let latest = latest.strip_prefix('v').unwrap_or(latest);

    if is_newer(latest, current_version) {
        UpdateStatus {
            has_update: true,
            latest_version: Some(latest.to_string()),
            url: Some(release.html_url.clone()),
        }
    } else {
        UpdateStatus {
            has_update: false,
            latest_version: None,
            url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("0.4.2", "0.4.1"), Ordering::Greater);
        assert_eq!(compare_versions("0.4.1", "0.10.0"), Ordering::Less);
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("v1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.x", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_is_newer() {
        assert!(is_newer("v0.5.0", "0.4.1"));
        assert!(!is_newer("0.4.1", "0.4.1"));
        assert!(!is_newer("0.3.9", "0.4.1"));
    }

    #[test]
    fn test_update_status() {
        let release: Release = serde_json::from_str(
            r#"{"tag_name": "v0.5.0", "html_url": "https://github.com/kaitas/tabCleaner/releases/tag/v0.5.0", "draft": false}"#,
        )
        .unwrap();

        let status = update_status(&release, "0.4.1");
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["hasUpdate"], true);
        assert_eq!(json["latestVersion"], "0.5.0");
        assert_eq!(json["url"], "https://github.com/kaitas/tabCleaner/releases/tag/v0.5.0");
        assert_eq!(update_status(&release, "0.5.0"), UpdateStatus {
            has_update: false,
            latest_version: None,
            url: None,
        });
    }
}
