use std::path::PathBuf;

use pixgraph::{Color, Context, ContextConfig, Path};

fn out_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("pixgraph_plasma.png"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let ctx = Context::init(ContextConfig::default())?;
    let mut g = ctx.new_graph()?;

    let plasma = g.plasma(512, 384, 7)?;
    let blur = g.gaussian_blur(4.0, 4.0)?;
    let badge: Path = "M96,96 L416,96 L416,288 L96,288 Z".parse()?;
    let fill = g.fill_path(&badge, &Color::parse("#20304080")?)?;
    let outline = g.vector_stroke(&badge, &Color::parse("#ffffff")?)?;
    let screen = g.compose(1)?;
    let out = out_path();
    let save = g.png_save(&out.to_string_lossy())?;

    g.connect_to(plasma, blur)?;
    g.connect_to(blur, fill)?;
    g.connect_to(fill, outline)?;
    g.connect_to(blur, screen)?;
    g.connect_to_aux(outline, screen)?;
    g.connect_to(screen, save)?;

    let stats = ctx.engine()?.process(&g, save)?;
    println!(
        "wrote {} ({} nodes, {} pixels)",
        out.display(),
        stats.nodes_evaluated(),
        stats.pixels
    );
    Ok(())
}
