use super::*;

fn builtins() -> OperationCatalog {
    OperationCatalog::with_builtins()
}

#[test]
fn builtin_catalog_lists_every_registered_operation_sorted() {
    let ops = builtins().list_operations();
    for name in [
        "gegl:buffer-source",
        "gegl:png-load",
        "gegl:jpg-load",
        "gegl:svg-load",
        "gegl:png-save",
        "gegl:jpg-save",
        "gegl:display",
        "gegl:perlin-noise",
        "gegl:plasma",
        "gegl:crop",
        "gegl:gaussian-blur",
        "gegl:edge-sobel",
        "gegl:image-gradient",
        "gegl:noise-pick",
        "gegl:threshold",
        "gegl:brightness-contrast",
        "gegl:normal-map",
        "gegl:dither",
        "gegl:pixelize",
        "gegl:invert-linear",
        "gegl:multiply",
        "gegl:difference",
        "gegl:screen",
        "gegl:overlay",
        "gegl:subtract",
        "gegl:exclusion",
        "gegl:fill-path",
        "gegl:vector-stroke",
    ] {
        assert!(ops.iter().any(|o| o == name), "missing {name}");
    }
    assert!(!ops.iter().any(|o| o == "gegl:slic"));
    let mut sorted = ops.clone();
    sorted.sort();
    assert_eq!(ops, sorted);
}

#[test]
fn list_properties_reports_names_and_type_tags() {
    let props = builtins().list_properties("gegl:jpg-save").unwrap();
    let pairs: Vec<_> = props.iter().map(|p| (p.name.as_str(), p.type_tag())).collect();
    assert_eq!(pairs, [("path", "string"), ("quality", "int")]);

    let json = serde_json::to_string(&props[1]).unwrap();
    assert_eq!(json, r#"{"name":"quality","type":"int"}"#);
}

#[test]
fn list_properties_fails_for_unknown_or_bare_operations() {
    let c = builtins();
    for name in ["gegl:does-not-exist", "gegl:invert-linear", ""] {
        match c.list_properties(name) {
            Err(PixError::UnknownOperation(n)) => assert_eq!(n, name),
            other => panic!("expected UnknownOperation for {name:?}, got {other:?}"),
        }
    }
}

#[test]
fn resolve_fills_defaults_and_widens_integers() {
    let c = builtins();
    let props = Properties::new().with("std-dev-x", 4i64);
    let (op, resolved) = c.resolve("gegl:gaussian-blur", &props).unwrap();
    assert_eq!(op.name(), "gegl:gaussian-blur");
    assert_eq!(resolved.double("std-dev-x").unwrap(), 4.0);
    assert_eq!(resolved.double("std-dev-y").unwrap(), 1.5);
    assert_eq!(resolved.operation(), "gegl:gaussian-blur");
}

#[test]
fn resolve_rejects_bad_properties() {
    let c = builtins();
    let unknown = Properties::new().with("radius", 1.0f64);
    assert!(matches!(
        c.resolve("gegl:gaussian-blur", &unknown),
        Err(PixError::Property { property, .. }) if property == "radius"
    ));

    let wrong = Properties::new().with("std-dev-x", "wide");
    assert!(matches!(
        c.resolve("gegl:gaussian-blur", &wrong),
        Err(PixError::Property { property, .. }) if property == "std-dev-x"
    ));

    assert!(matches!(
        c.resolve("gegl:png-load", &Properties::new()),
        Err(PixError::Property { property, .. }) if property == "path"
    ));

    assert!(matches!(
        c.resolve("gegl:slic", &Properties::new()),
        Err(PixError::UnknownOperation(_))
    ));
}

struct Passthrough;

impl Operation for Passthrough {
    fn name(&self) -> &str {
        "test:passthrough"
    }

    fn kind(&self) -> OperationKind {
        OperationKind::Filter
    }

    fn process(&self, ctx: &ProcessContext<'_>) -> PixResult<Raster> {
        Ok(ctx.input_or_empty().crop(ctx.roi))
    }
}

#[test]
fn custom_operations_can_be_registered() {
    let mut c = OperationCatalog::new();
    assert!(c.list_operations().is_empty());
    c.register(Passthrough);
    assert!(c.contains("test:passthrough"));
    assert!(c.get("test:passthrough").is_ok());
    assert!(matches!(c.get("gegl:crop"), Err(PixError::UnknownOperation(_))));
    assert!(c.property_specs("test:passthrough").unwrap().is_empty());
}
