use crate::output::print_json;
use civica_core::role::{self, Role};
use std::str::FromStr;

pub fn run(role: &str, json: bool) -> anyhow::Result<()> {
    let role = Role::from_str(role)?;
    let capabilities = role::permissions_for(role);

    if json {
        let names: Vec<&str> = capabilities.iter().map(|c| c.as_str()).collect();
        print_json(&serde_json::json!({
            "role": role.as_str(),
            "admin_tier": role.admin_tier(),
            "scope_limited": !role.bypasses_scope(),
            "capabilities": names,
        }))?;
        return Ok(());
    }

    println!("Role: {role}");
    match role.admin_tier() {
        Some(tier) => println!("Admin tier: {tier}"),
        None => println!("Admin tier: none (operational role)"),
    }
    println!(
        "Scope: {}",
        if role.bypasses_scope() {
            "all scopes"
        } else {
            "own scope only"
        }
    );
    for capability in capabilities {
        println!("  - {capability}");
    }
    Ok(())
}
