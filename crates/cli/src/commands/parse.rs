use envlink_core::Reference;

pub fn execute(value: &str) -> eyre::Result<()> {
    match Reference::parse(value)? {
        Some(reference) => println!("{}", serde_json::to_string_pretty(&reference)?),
        None => println!("not a reference"),
    }
    Ok(())
}
