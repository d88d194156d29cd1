//! Prints the JSON schema of the node request document

use node_spec::NodeRequest;

fn main() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(NodeRequest);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
