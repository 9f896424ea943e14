//! Platform asset selection.
//!
//! Releases name their binaries after the platform they were built for. The
//! selector tries a fixed list of naming templates, most specific first:
//!
//! | # | Template |
//! |---|----------|
//! | 1 | `{name}_{version}_{os}_{arch}.{ext}` |
//! | 2 | `{name}-{version}-{os}-{arch}.{ext}` |
//! | 3 | `{name}_{os}_{arch}.{ext}` |
//! | 4 | `{name}-{os}-{arch}.{ext}` |
//!
//! `ext` is `zip` on Windows and `tar.gz` elsewhere. `{version}` matches the
//! tag both as published and without a leading `v`, so `v1.2.0` matches
//! `tool_1.2.0_linux_amd64.tar.gz` as well. Comparison is case-insensitive.
//!
//! A template wins if it matches exactly one asset. A template matching
//! several assets is treated as ambiguous and skipped.

use crate::core::{ExecmanError, Result};
use crate::release::Asset;
use crate::utils::platform::Platform;
use tracing::debug;

#[derive(Clone, Copy)]
enum Template {
    UnderscoreVersioned,
    DashVersioned,
    Underscore,
    Dash,
}

const TEMPLATES: [Template; 4] = [
    Template::UnderscoreVersioned,
    Template::DashVersioned,
    Template::Underscore,
    Template::Dash,
];

impl Template {
    /// Candidate file names, lowercased, one per version spelling.
    fn expand(self, name: &str, versions: &[&str], platform: &Platform) -> Vec<String> {
        let (os, arch, ext) = (&platform.os, &platform.arch, platform.archive_extension());
        let names: Vec<String> = match self {
            Self::UnderscoreVersioned => {
                versions.iter().map(|v| format!("{name}_{v}_{os}_{arch}.{ext}")).collect()
            }
            Self::DashVersioned => {
                versions.iter().map(|v| format!("{name}-{v}-{os}-{arch}.{ext}")).collect()
            }
            Self::Underscore => vec![format!("{name}_{os}_{arch}.{ext}")],
            Self::Dash => vec![format!("{name}-{os}-{arch}.{ext}")],
        };
        names.into_iter().map(|n| n.to_lowercase()).collect()
    }
}

/// Selects the asset built for `platform`.
///
/// # Errors
///
/// [`ExecmanError::NoMatchingAsset`] with the platform and every asset name
/// when no template matches exactly one asset.
///
/// # Examples
///
/// ```rust
/// use execman::release::{Asset, select_asset};
/// use execman::utils::platform::Platform;
///
/// let assets: Vec<Asset> = ["app_v1.0.0_linux_amd64.tar.gz", "app_v1.0.0_darwin_amd64.tar.gz"]
///     .iter()
///     .map(|n| Asset { name: n.to_string(), download_url: String::new(), size: 0 })
///     .collect();
///
/// let chosen = select_asset(&assets, "app", "v1.0.0", &Platform::new("linux", "amd64")).unwrap();
/// assert_eq!(chosen.name, "app_v1.0.0_linux_amd64.tar.gz");
/// assert!(select_asset(&assets, "app", "v1.0.0", &Platform::new("windows", "amd64")).is_err());
/// ```
pub fn select_asset<'a>(
    assets: &'a [Asset],
    name: &str,
    version: &str,
    platform: &Platform,
) -> Result<&'a Asset> {
    let mut versions = vec![version];
    if let Some(bare) = version.strip_prefix('v').filter(|v| !v.is_empty()) {
        versions.push(bare);
    }

    for template in TEMPLATES {
        let candidates = template.expand(name, &versions, platform);
        let matches: Vec<&Asset> = assets
            .iter()
            .filter(|asset| candidates.contains(&asset.name.to_lowercase()))
            .collect();

        match matches.as_slice() {
            [single] => {
                debug!("Selected asset {} for {}", single.name, platform);
                return Ok(*single);
            }
            [] => {}
            several => debug!(
                "Skipping ambiguous template for {}: {} assets match ({})",
                platform,
                several.len(),
                several.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
            ),
        }
    }

    Err(ExecmanError::NoMatchingAsset {
        platform: platform.to_string(),
        assets: assets.iter().map(|a| a.name.clone()).collect(),
    })
}
