use anyhow::Result;
use log::info;
use std::path::Path;
use uml_graph_editor::{
    CentralRepository, Classifier, ClassifierKind, Diagram, DiagramKind, EditorConfig,
    EditorContext, Endpoint, LinkKind, LinkProperties, Rectangle, SelectionController,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional JSON config as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => EditorConfig::load(Path::new(&path))?,
        None => EditorConfig::default(),
    };
    info!(tolerance = config.endpoint_tolerance; "Starting UML graph editor demo");

    println!("UML Graph Editor - Editing Engine Demo");
    println!("======================================\n");

    let mut ctx = EditorContext::with_repository(CentralRepository::new(), config);
    let mut classes =
        SelectionController::new(Diagram::new("Domain", DiagramKind::Class), &ctx.config);

    // Two classes joined by an association
    let a = classes.add_node(
        &mut ctx,
        Classifier::new(ClassifierKind::Class, "Order"),
        Rectangle::new(0.0, 0.0, 120.0, 80.0),
    )?;
    let b = classes.add_node(
        &mut ctx,
        Classifier::new(ClassifierKind::Class, "Customer"),
        Rectangle::new(300.0, 0.0, 120.0, 80.0),
    )?;
    let association = classes.add_link(
        &mut ctx,
        LinkKind::Association,
        a,
        b,
        LinkProperties::named("placed by"),
    )?;

    println!("✓ Created 2 classes and an association");
    println!("  Elements: {}", classes.model().len());

    // A second identical association is refused
    if let Err(err) = classes.add_link(&mut ctx, LinkKind::Association, a, b, LinkProperties::default()) {
        println!("\n✗ Duplicate association rejected: {err}");
    }

    // Copy both classes and paste them
    classes.add_element_to_selection(a)?;
    classes.add_element_to_selection(b)?;
    classes.copy_selected(&mut ctx)?;
    let pasted = classes.paste_clipboard(&mut ctx)?;

    println!("\n✓ Copied and pasted the selection");
    println!("  Pasted top-level elements: {}", pasted.len());
    println!("  Elements: {}", classes.model().len());
    println!("  Relationships in repository: {}", ctx.repository.relationship_count());

    // Reconnect the original association onto a third class
    let c = classes.add_node(
        &mut ctx,
        Classifier::new(ClassifierKind::Class, "Account"),
        Rectangle::new(300.0, 200.0, 120.0, 80.0),
    )?;
    let moved = classes.reconnect(&mut ctx, association, Endpoint::Target, c)?;
    println!("\n✓ Reconnected the association target");
    println!("  New link: {moved}");

    // Delete the first class with everything attached
    classes.clear_selected();
    classes.add_element_to_selection(a)?;
    let removed = classes.delete_selected(&mut ctx)?;
    println!("\n✓ Deleted 'Order' and its closure ({removed} elements)");

    // Walk the history back and forth
    while classes.can_undo() {
        let description = classes.undo(&mut ctx)?;
        println!("  ↶ Undo {description}");
    }
    println!("\n📊 After undoing everything:");
    println!("  └─ Elements: {}", classes.model().len());
    println!("  └─ Classifiers: {}", ctx.repository.classifier_count());

    while classes.can_redo() {
        classes.redo(&mut ctx)?;
    }
    println!("\n📊 After redoing everything:");
    println!("  └─ Elements: {}", classes.model().len());
    println!("  └─ Consistent: {}", classes.model().check_integrity().is_consistent());

    let json = classes.model().snapshot().to_json()?;
    println!("\n✅ Snapshot is {} bytes of JSON", json.len());

    Ok(())
}
