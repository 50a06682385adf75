use std::collections::BTreeMap;

use pixgraph::{Context, ContextConfig, PropertyInfo};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = match std::env::args().nth(1) {
        Some(json) => ContextConfig::from_json_str(&json)?,
        None => ContextConfig::default(),
    };
    let ctx = Context::init(cfg)?;

    let mut catalog: BTreeMap<String, Vec<PropertyInfo>> = BTreeMap::new();
    for op in ctx.list_operations()? {
        let props = match ctx.list_properties(&op) {
            Ok(props) => props,
            Err(pixgraph::PixError::UnknownOperation(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        catalog.insert(op, props);
    }
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}
