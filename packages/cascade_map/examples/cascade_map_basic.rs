//! Basic example demonstrating the `cascade_map` registry.
//!
//! Shows the three core ideas of the package:
//! - `insert`: register a root key holding shared state
//! - `insert_linked`: alias further keys to that root
//! - `guard`: release the whole key family in one cascade
//!
//! Run with: `cargo run --example cascade_map_basic`.

use std::sync::Arc;

use cascade_map::CascadeMap;

fn main() {
    println!("=== Cascading Registry Example ===");
    println!();

    let map = CascadeMap::new();

    // Register shared state for a logical request under its primary key.
    map.insert("order-17", Arc::new("order checkout state".to_string()));
    println!("✓ Registered root key 'order-17'");

    // Alias two more keys to the same state, as nested processing stages would.
    map.insert_linked("order-17-payment", "order-17", || Arc::new(String::new()));
    map.insert_linked("order-17-shipping", "order-17", || Arc::new(String::new()));
    println!("✓ Linked 'order-17-payment' and 'order-17-shipping'");
    println!();

    // Any key of the family resolves to the same shared value.
    let via_root = map.get("order-17").expect("key was just registered");
    let via_alias = map.get("order-17-payment").expect("key was just linked");
    println!("Shared state via root:  {via_root}");
    println!("Shared state via alias: {via_alias}");
    println!(
        "Same underlying value: {}",
        Arc::ptr_eq(&via_root, &via_alias)
    );
    println!();

    println!("Registered keys before release: {}", map.len());
    println!(
        "Children of 'order-17': {:?}",
        map.children_of("order-17").expect("root key is present")
    );

    // Dropping the root guard removes the root and both aliases in one pass.
    drop(map.guard("order-17"));
    println!("Registered keys after release:  {}", map.len());
    println!();

    // The value itself survives for as long as someone holds the Arc.
    println!("State still readable after release: {via_root}");
}
