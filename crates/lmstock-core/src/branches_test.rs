use std::io::Write;

use super::*;

fn branch(code: &str, city: &str) -> Branch {
    Branch {
        code: code.to_string(),
        city: city.to_string(),
        name: format!("{city} {code}"),
        supports_shipping: true,
        kind: BranchKind::Regular,
    }
}

#[test]
fn label_with_city_suffix() {
    let b = Branch::from_location_label("ASB1", "BELM - Surabaya Darmo, Surabaya");
    assert_eq!(b.code, "ASB1");
    assert_eq!(b.name, "Surabaya Darmo");
    assert_eq!(b.city, "Surabaya");
    assert_eq!(b.kind, BranchKind::Regular);
    assert!(b.supports_shipping);
}

#[test]
fn label_pickup_only_marker() {
    let b = Branch::from_location_label(
        "AJK4",
        "BELM - Setiabudi One (Pengambilan Di Butik), Jakarta Selatan",
    );
    assert_eq!(b.name, "Setiabudi One");
    assert_eq!(b.city, "Jakarta Selatan");
    assert_eq!(b.kind, BranchKind::PickupOnly);
    assert!(!b.supports_shipping);
}

#[test]
fn label_pickup_marker_lowercase() {
    let b = Branch::from_location_label("X1", "Bintaro (pengambilan Di Butik), Tangerang");
    assert_eq!(b.kind, BranchKind::PickupOnly);
}

#[test]
fn label_shipping_only_marker() {
    let b = Branch::from_location_label("AEXP", "Gedung Antam (Pengiriman Ekspedisi), Jakarta");
    assert_eq!(b.name, "Gedung Antam");
    assert_eq!(b.kind, BranchKind::ShippingOnly);
    assert!(b.supports_shipping);
}

#[test]
fn label_without_comma_uses_name_as_city() {
    let b = Branch::from_location_label("ABDG", "BELM - Bandung");
    assert_eq!(b.name, "Bandung");
    assert_eq!(b.city, "Bandung");
}

#[test]
fn builtin_registry_contains_major_branches() {
    let registry = BranchRegistry::builtin();
    for code in MAJOR_BRANCH_CODES {
        assert!(registry.get(code).is_some(), "missing builtin branch {code}");
    }
}

#[test]
fn lookup_is_case_insensitive() {
    let registry = BranchRegistry::builtin();
    let b = registry.get(" asb1 ").expect("ASB1 should resolve");
    assert_eq!(b.city, "Surabaya");
}

#[test]
fn new_rejects_duplicate_codes_ignoring_case() {
    let err = BranchRegistry::new(vec![branch("ABDG", "Bandung"), branch("abdg", "Bandung")])
        .unwrap_err();
    assert!(err.to_string().contains("duplicate branch code"));
}

#[test]
fn new_rejects_empty_code() {
    let err = BranchRegistry::new(vec![branch("  ", "Bandung")]).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn new_rejects_empty_city() {
    let err = BranchRegistry::new(vec![branch("ABDG", "")]).unwrap_err();
    assert!(err.to_string().contains("non-empty name and city"));
}

#[test]
fn new_rejects_shipping_pickup_only() {
    let mut b = branch("AJK4", "Jakarta");
    b.kind = BranchKind::PickupOnly;
    let err = BranchRegistry::new(vec![b]).unwrap_err();
    assert!(err.to_string().contains("pickup_only"));
}

#[test]
fn shipping_and_pickup_views() {
    let mut pickup = branch("AJK4", "Jakarta");
    pickup.kind = BranchKind::PickupOnly;
    pickup.supports_shipping = false;
    let registry = BranchRegistry::new(vec![branch("ABDG", "Bandung"), pickup]).unwrap();

    let shipping: Vec<&str> = registry.shipping().iter().map(|b| b.code.as_str()).collect();
    assert_eq!(shipping, vec!["ABDG"]);
    let pickup: Vec<&str> = registry.pickup_only().iter().map(|b| b.code.as_str()).collect();
    assert_eq!(pickup, vec!["AJK4"]);
}

#[test]
fn prioritized_moves_priority_cities_first_and_keeps_order() {
    let registry = BranchRegistry::new(vec![
        branch("ADPS", "Denpasar"),
        branch("ASB1", "Surabaya"),
        branch("AMKS", "Makassar"),
        branch("AJK2", "Jakarta"),
    ])
    .unwrap();
    let order: Vec<&str> = registry
        .prioritized(&PRIORITY_CITIES)
        .iter()
        .map(|b| b.code.as_str())
        .collect();
    assert_eq!(order, vec!["ASB1", "AJK2", "ADPS", "AMKS"]);
}

#[test]
fn by_city_groups_branches() {
    let registry = BranchRegistry::new(vec![
        branch("AJK2", "Jakarta"),
        branch("AJK4", "Jakarta"),
        branch("ABDG", "Bandung"),
    ])
    .unwrap();
    let cities = registry.by_city();
    assert_eq!(cities.len(), 2);
    assert_eq!(cities["Jakarta"].len(), 2);
    assert_eq!(cities["Bandung"][0].code, "ABDG");
}

#[test]
fn load_branches_from_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "branches:\n  - code: ASB1\n    city: Surabaya\n    name: Surabaya Darmo\n  - code: AJK4\n    city: Jakarta\n    name: Setiabudi One\n    kind: pickup_only\n    supports_shipping: false\n"
    )
    .unwrap();

    let registry = load_branches(file.path()).expect("valid branches file");
    assert_eq!(registry.len(), 2);
    let darmo = registry.get("ASB1").unwrap();
    assert!(darmo.supports_shipping, "supports_shipping defaults to true");
    assert_eq!(darmo.kind, BranchKind::Regular);
    assert_eq!(registry.get("AJK4").unwrap().kind, BranchKind::PickupOnly);
}

#[test]
fn load_branches_missing_file() {
    let err = load_branches(Path::new("/nonexistent/branches.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::BranchesFileIo { .. }));
}

#[test]
fn load_branches_invalid_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "branches: [this is: not valid").unwrap();
    let err = load_branches(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::BranchesFileParse(_)));
}
