use super::resolve::InUseSet;
use crate::coordinate::Coordinate;

/// Entries of `inventory` that are not in use, in inventory order.
///
/// Both sides hold decoded coordinates, so `github.com/!burnt!sushi/toml` on
/// disk matches `github.com/BurntSushi/toml` in a `go.mod`.
pub fn unused(inventory: &[Coordinate], in_use: &InUseSet) -> Vec<Coordinate> {
    inventory
        .iter()
        .filter(|coordinate| !in_use.contains(coordinate))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    #[test]
    fn test_unused_preserves_scan_order() {
        let inventory = vec![coord("a@v1"), coord("a@v2"), coord("b@v1")];
        let in_use = InUseSet::from_iter([coord("a@v1")]);

        assert_eq!(
            unused(&inventory, &in_use),
            vec![coord("a@v2"), coord("b@v1")]
        );
    }

    #[test]
    fn test_uppercase_module_matches_escaped_inventory() {
        let inventory = vec![
            Coordinate::parse_escaped("github.com/!burnt!sushi/toml@v1.3.2").unwrap(),
            Coordinate::parse_escaped("github.com/!burnt!sushi/toml@v1.2.0").unwrap(),
        ];
        let in_use = InUseSet::from_iter([coord("github.com/BurntSushi/toml@v1.3.2")]);

        assert_eq!(
            unused(&inventory, &in_use),
            vec![coord("github.com/BurntSushi/toml@v1.2.0")]
        );
    }

    #[test]
    fn test_everything_unused_when_nothing_in_use() {
        let inventory = vec![coord("a@v1"), coord("b@v1")];
        assert_eq!(unused(&inventory, &InUseSet::default()), inventory);
    }
}
