use proptest::prelude::*;
use reelmerge::placeholder::{contains_token, resolve};
use reelmerge::{CatalogSource, NoDataSource, PlaceholderResolver};

fn write_catalog(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("catalog.json");
    let doc = serde_json::json!({
        "Indeksy": [
            { "Item No_": 10004, "Assortment Card No_": "K-7",
              "DescriptionPL": "Stół dębowy", "DescriptionENU": "Oak table" },
            { "Item No_": "20001", "Assortment Card No_": "K-9",
              "DescriptionPL": "", "DescriptionENU": null }
        ],
        "Opisy": [
            { "Assortment Card No_": "K-7", "Opis Indeksu": "Solidny stół" },
            { "Assortment Card No_": "K-7", "Opis Indeksu": "do jadalni" }
        ],
        "Materialy": [
            { "Assortment Card No_": "K-7", "Material": "dąb" }
        ]
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    path
}

#[test]
fn catalog_tokens_are_substituted() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = CatalogSource::load(&write_catalog(dir.path())).unwrap();

    assert_eq!(
        resolve(&catalog, "{NAZWA_PL} - {INDEKS}", "10004"),
        "Stół dębowy - 10004"
    );
    assert_eq!(resolve(&catalog, "{NAZWA_EN}", "10004"), "Oak table");
    assert_eq!(
        resolve(&catalog, "{OPIS} / {MATERIALY}", "10004"),
        "Solidny stół do jadalni / dąb"
    );
}

#[test]
fn missing_data_yields_readable_text() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = CatalogSource::load(&write_catalog(dir.path())).unwrap();

    assert_eq!(
        resolve(&catalog, "{NAZWA_PL}|{NAZWA_EN}", "20001"),
        "Brak opisu polskiego|Brak opisu angielskiego"
    );
    assert_eq!(
        resolve(&catalog, "{NAZWA_PL}|{NAZWA_EN}", "99999"),
        "Nie znaleziono produktu|Product not found"
    );
    assert_eq!(resolve(&catalog, "{OPIS}", "20001"), "nie znaleziono opisu w bazie");

    let failed = resolve(&catalog, "{MATERIALY}", "99999");
    assert!(failed.contains("MATERIALY"), "{failed}");
}

#[test]
fn unknown_tokens_pass_through() {
    assert_eq!(resolve(&NoDataSource, "{FOO} {INDEKS}", "7"), "{FOO} 7");
    assert!(contains_token("{FOO}"));
    assert!(!contains_token("plain text"));
}

#[test]
fn resolver_trims_the_identifier() {
    let mut resolver = PlaceholderResolver::new(&NoDataSource, "  42 ");
    assert_eq!(resolver.item_identifier(), "42");
    assert_eq!(resolver.resolve("#{INDEKS}"), "#42");
}

#[test]
fn unreadable_catalog_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CatalogSource::load(&dir.path().join("nope.json")).is_err());

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert!(CatalogSource::load(&bad).is_err());
}

proptest! {
    #[test]
    fn empty_identifier_leaves_text_untouched(text in "[ -~]{0,40}") {
        prop_assert_eq!(resolve(&NoDataSource, &text, ""), text.clone());
        prop_assert_eq!(resolve(&NoDataSource, &text, "   "), text);
    }

    #[test]
    fn text_without_braces_is_never_changed(text in "[a-zA-Z0-9 ,.-]{0,40}", item in "[0-9]{1,6}") {
        prop_assert_eq!(resolve(&NoDataSource, &text, &item), text);
    }
}
