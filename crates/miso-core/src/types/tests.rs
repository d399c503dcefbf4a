//! Unit tests for identity, key and version-set types

use super::*;
use super::version::version_label;
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn test_provider_binary_key() {
    let provider = ProviderAddress::new("ns", "t");
    let key = provider.binary_key("1.0.0", &ProviderPlatform::new("linux", "amd64"));

    assert_eq!(
        key.as_str(),
        "providers/ns/t/1.0.0/linux/amd64/terraform-provider-t_v1.0.0"
    );
}

#[test]
fn test_module_archive_key() {
    let module = ModuleAddress::new("ns", "m", "p");
    assert_eq!(module.archive_key("1.0.0").as_str(), "modules/ns/m/p/1.0.0/module.zip");
}

#[test]
fn test_versions_prefixes() {
    assert_eq!(
        ProviderAddress::new("acme", "widget").versions_prefix(),
        "providers/acme/widget/"
    );
    assert_eq!(
        ModuleAddress::new("acme", "vpc", "aws").versions_prefix(),
        "modules/acme/vpc/aws/"
    );
}

#[test]
fn test_binary_key_starts_with_versions_prefix() {
    let provider = ProviderAddress::new("acme", "widget");
    let key = provider.binary_key("2.3.4", &ProviderPlatform::new("darwin", "arm64"));
    let prefix = provider.versions_prefix();

    assert!(key.as_str().starts_with(&prefix));
    assert_eq!(version_label(&prefix, key.as_str()), Some("2.3.4"));
}

#[test]
fn test_provider_address_deserializes_type_field() {
    let provider: ProviderAddress =
        serde_json::from_str(r#"{"namespace":"hashicorp","type":"aws"}"#).unwrap();
    assert_eq!(provider, ProviderAddress::new("hashicorp", "aws"));
}

#[test]
fn test_version_set_scenario() {
    let keys = [
        "providers/acme/widget/1.0.0/linux/amd64/terraform-provider-widget_v1.0.0",
        "providers/acme/widget/1.1.0/linux/amd64/terraform-provider-widget_v1.1.0",
    ];
    let set = VersionSet::from_keys("providers/acme/widget/", keys);

    assert_eq!(set.len(), 2);
    assert!(set.contains("1.0.0"));
    assert!(set.contains("1.1.0"));
}

#[test]
fn test_version_set_collapses_platforms() {
    let keys = [
        "providers/acme/widget/1.0.0/linux/amd64/terraform-provider-widget_v1.0.0",
        "providers/acme/widget/1.0.0/darwin/arm64/terraform-provider-widget_v1.0.0",
        "providers/acme/widget/1.0.0/windows/amd64/terraform-provider-widget_v1.0.0",
    ];
    let set = VersionSet::from_keys("providers/acme/widget/", keys);

    assert_eq!(set.len(), 1);
    assert!(set.contains("1.0.0"));
}

#[test]
fn test_version_set_empty_listing() {
    let set = VersionSet::from_keys("modules/ns/m/p/", Vec::<String>::new());
    assert!(set.is_empty());
}

#[test]
fn test_version_label_edge_cases() {
    // Single segment after the prefix
    assert_eq!(version_label("providers/a/b/", "providers/a/b/0.1.0"), Some("0.1.0"));
    // Folder marker
    assert_eq!(version_label("providers/a/b/", "providers/a/b/"), None);
    // Key outside the prefix is taken whole
    assert_eq!(version_label("providers/a/b/", "stray"), Some("stray"));
}

#[test]
fn test_version_set_skips_empty_version_segment() {
    // "providers/a/b//x" has an empty first segment and yields no version
    let set = VersionSet::from_keys(
        "providers/a/b/",
        ["providers/a/b/", "providers/a/b//x", "providers/a/b/1.0.0/x"],
    );

    assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["1.0.0".to_string()]);
    assert_eq!(version_label("providers/a/b/", "providers/a/b//x"), None);
}

#[test]
fn test_download_mode_parsing() {
    assert_eq!("presigned-url".parse::<DownloadMode>().unwrap(), DownloadMode::PresignedUrl);
    assert_eq!("proxy".parse::<DownloadMode>().unwrap(), DownloadMode::Proxy);
    assert!("redirect".parse::<DownloadMode>().is_err());
    assert_eq!(DownloadMode::default(), DownloadMode::PresignedUrl);
}

#[test]
fn test_download_mode_serde_names() {
    let mode: DownloadMode = serde_json::from_str(r#""proxy""#).unwrap();
    assert_eq!(mode, DownloadMode::Proxy);
    assert_eq!(
        serde_json::to_string(&DownloadMode::PresignedUrl).unwrap(),
        r#""presigned-url""#
    );
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9.]{1,8}"
}

proptest! {
    #[test]
    fn prop_version_set_is_distinct_first_segments(
        entries in prop::collection::vec((segment(), segment()), 0..32)
    ) {
        let prefix = "modules/ns/m/p/";
        let keys: Vec<String> = entries
            .iter()
            .map(|(version, file)| format!("{}{}/{}", prefix, version, file))
            .collect();

        let expected: HashSet<String> = entries.iter().map(|(v, _)| v.clone()).collect();
        let forward: HashSet<String> = VersionSet::from_keys(prefix, &keys).into_iter().collect();

        let mut reversed = keys.clone();
        reversed.reverse();
        let backward: HashSet<String> = VersionSet::from_keys(prefix, &reversed).into_iter().collect();

        prop_assert_eq!(&forward, &expected);
        prop_assert_eq!(&backward, &expected);
    }
}
