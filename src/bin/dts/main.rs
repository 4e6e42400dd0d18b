//! DTS CLI - Tool for inspecting and converting shape and sequence files.

use std::collections::BTreeMap;
use std::env;
use std::process;

use dts::prelude::*;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "warn";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => with_file(&filtered_args, "info <file.dts>", cmd_info),
        "tree" | "t" => with_file(&filtered_args, "tree <file.dts>", cmd_tree),
        "dump" | "d" => {
            let json = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
            let rest: Vec<&str> = filtered_args.iter().copied().filter(|&s| s != "--json" && s != "-j").collect();
            with_file(&rest, "dump <file.dts> [--json]", |path| cmd_dump(path, json))
        }
        "verify" => with_file(&filtered_args, "verify <file.dts>", cmd_verify),
        "copy" | "c" => cmd_copy(&filtered_args[1..]),
        "dsq" => with_file(&filtered_args, "dsq <file.dsq>", cmd_dsq),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // A bare file path runs `info` or `dsq`
        path if path.to_ascii_lowercase().ends_with(".dts") => cmd_info(path),
        path if path.to_ascii_lowercase().ends_with(".dsq") => cmd_dsq(path),
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install a stderr subscriber; `RUST_LOG` overrides the flag-selected level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn with_file(args: &[&str], usage: &str, f: impl FnOnce(&str) -> Result<()>) -> Result<()> {
    match args.get(1) {
        Some(&path) => f(path),
        None => {
            eprintln!("Error: missing file argument");
            eprintln!("Usage: dts {}", usage);
            process::exit(1);
        }
    }
}

fn print_help() {
    println!("dts - DTS shape and sequence file toolkit");
    println!();
    println!("USAGE:");
    println!("    dts [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>                  Show version and section counts");
    println!("    t, tree   <file>                  Show node hierarchy with objects");
    println!("    d, dump   <file> [--json]         Dump sequences, materials and detail levels");
    println!("    verify    <file>                  Check cross-references and transforms");
    println!("    c, copy   <in> <out> [--version N] Load and re-save (default: source version)");
    println!("    dsq       <file>                  Summarize a sequence file");
    println!("    h, help                           Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("EXAMPLES:");
    println!("    dts info player.dts                  # Quick overview");
    println!("    dts tree player.dts                  # See hierarchy");
    println!("    dts dump player.dts --json           # Sequences and materials as JSON");
    println!("    dts copy old.dts new.dts --version 24");
    println!("    dts -v verify player.dts");
    println!();
    println!("NOTES:");
    println!("    - Passing a .dts or .dsq file directly is equivalent to 'info' or 'dsq'");
    println!("    - RUST_LOG overrides the verbosity flags");
}

fn name_of(shape: &Shape, index: i32) -> &str {
    shape.names.get(index).unwrap_or("<unnamed>")
}

fn cmd_info(path: &str) -> Result<()> {
    let shape = Shape::open(path)?;

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for mesh in &shape.meshes {
        *kinds.entry(mesh.kind().name()).or_default() += 1;
    }
    let kinds: Vec<String> = kinds.iter().map(|(k, n)| format!("{} {}", n, k)).collect();

    println!("File: {}", path);
    println!("Version: {} (exporter {})", shape.version, shape.exporter_version);
    println!();
    println!("Nodes:          {}", shape.nodes.len());
    println!("Objects:        {}", shape.objects.len());
    println!("Decals:         {}", shape.decals.len());
    println!("Subshapes:      {}", shape.subshapes.len());
    println!("IFL materials:  {}", shape.ifl_materials.len());
    println!("Materials:      {}", shape.materials.len());
    println!("Detail levels:  {}", shape.detail_levels.len());
    println!(
        "Meshes:         {}{}",
        shape.meshes.len(),
        if kinds.is_empty() { String::new() } else { format!(" ({})", kinds.join(", ")) }
    );
    println!("Sequences:      {}", shape.sequences.len());
    println!("Triggers:       {}", shape.triggers.len());
    println!("Names:          {}", shape.names.len());
    println!();
    println!("Keyframes: {} rotations, {} translations", shape.node_rotations.len(), shape.node_translations.len());
    println!(
        "Scales:    {} uniform, {} aligned, {} arbitrary",
        shape.node_uniform_scales.len(),
        shape.node_aligned_scales.len(),
        shape.node_arbitrary_scale_factors.len()
    );
    println!("Ground:    {} frames", shape.ground_translations.len());
    println!();
    println!("Radius: {:.4} (tube {:.4})", shape.radius, shape.radius_tube);
    println!("Center: {:?}", shape.center.to_array());
    println!("Bounds: {:?}", shape.bounds);
    Ok(())
}

fn cmd_tree(path: &str) -> Result<()> {
    let shape = Shape::open(path)?;

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); shape.nodes.len()];
    let mut roots = Vec::new();
    for (i, node) in shape.nodes.iter().enumerate() {
        match usize::try_from(node.parent) {
            Ok(p) if p < shape.nodes.len() => children[p].push(i),
            _ => roots.push(i),
        }
    }

    println!("Shape: {}", path);
    println!();
    let mut visited = vec![false; shape.nodes.len()];
    for root in roots {
        print_tree(&shape, &children, &mut visited, root, 0);
    }
    if visited.iter().any(|v| !v) {
        println!();
        println!("(nodes unreachable from any root: parent cycle)");
    }
    Ok(())
}

fn print_tree(shape: &Shape, children: &[Vec<usize>], visited: &mut [bool], node: usize, depth: usize) {
    if visited[node] {
        return;
    }
    visited[node] = true;

    let indent = "  ".repeat(depth);
    println!("{}{} [{}]", indent, name_of(shape, shape.nodes[node].name), node);

    for obj in shape.objects.iter().filter(|o| o.node == node as i32) {
        let meshes: Vec<&str> = shape.object_meshes(obj).iter().map(|m| m.kind().name()).collect();
        println!("{}  * {} ({})", indent, name_of(shape, obj.name), meshes.join(", "));
    }
    for &child in &children[node] {
        print_tree(shape, children, visited, child, depth + 1);
    }
}

fn cmd_dump(path: &str, json: bool) -> Result<()> {
    let shape = Shape::open(path)?;
    let num_nodes = shape.nodes.len();

    if json {
        let sequences: Vec<serde_json::Value> = shape
            .sequences
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": name_of(&shape, s.name),
                    "keyframes": s.num_keyframes,
                    "duration": s.duration,
                    "priority": s.priority,
                    "cyclic": s.is_cyclic(),
                    "blend": s.is_blend(),
                    "scale": format!("{:?}", s.scale_mode()),
                    "rotation_nodes": s.rotation_nodes(num_nodes),
                    "translation_nodes": s.translation_nodes(num_nodes),
                    "ground_frames": s.num_ground_frames,
                    "triggers": s.num_triggers,
                })
            })
            .collect();
        let materials: Vec<serde_json::Value> = shape
            .materials
            .iter()
            .map(|m| {
                serde_json::json!({
                    "name": m.name,
                    "flags": m.flags,
                    "translucent": m.has_flag(Material::TRANSLUCENT),
                    "detail_map": m.detail_map_index(),
                    "bump_map": m.bump_map_index(),
                    "reflectance_map": m.reflectance_map_index(),
                })
            })
            .collect();
        let detail_levels: Vec<serde_json::Value> = shape
            .detail_levels
            .iter()
            .map(|d| {
                serde_json::json!({
                    "name": name_of(&shape, d.name),
                    "size": d.size,
                    "subshape": d.subshape,
                    "object_detail": d.object_detail,
                    "poly_count": d.poly_count,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "file": path,
                "version": shape.version,
                "sequences": sequences,
                "materials": materials,
                "detail_levels": detail_levels,
            }))
            .unwrap_or_default()
        );
        return Ok(());
    }

    println!("File: {} (version {})", path, shape.version);
    println!();
    println!("Sequences ({}):", shape.sequences.len());
    for s in &shape.sequences {
        println!(
            "  {:<24} {:>4} keys {:>7.3}s  prio {:<3} {}{}scale {:?}, {} rot / {} trans nodes",
            name_of(&shape, s.name),
            s.num_keyframes,
            s.duration,
            s.priority,
            if s.is_cyclic() { "cyclic, " } else { "" },
            if s.is_blend() { "blend, " } else { "" },
            s.scale_mode(),
            s.rotation_nodes(num_nodes).len(),
            s.translation_nodes(num_nodes).len(),
        );
    }
    println!();
    println!("Materials ({}):", shape.materials.len());
    for (i, m) in shape.materials.iter().enumerate() {
        println!("  [{}] {:<32} flags 0x{:08x}", i, m.name, m.flags);
    }
    println!();
    println!("Detail levels ({}):", shape.detail_levels.len());
    for d in &shape.detail_levels {
        println!(
            "  {:<16} size {:>8.2}  subshape {:>2}  detail {:>2}  polys {}",
            name_of(&shape, d.name),
            d.size,
            d.subshape,
            d.object_detail,
            d.poly_count
        );
    }
    Ok(())
}

fn cmd_verify(path: &str) -> Result<()> {
    let shape = Shape::open(path)?;
    shape.verify()?;
    shape.world_matrices()?;

    let unsupported = shape
        .meshes
        .iter()
        .filter(|m| matches!(m.kind(), MeshKind::Decal | MeshKind::Sorted))
        .count();
    if unsupported > 0 {
        tracing::warn!(unsupported, "shape has meshes that cannot be saved");
    }

    let bytes = shape.to_bytes(shape.version)?;
    let again = Shape::load(&bytes)?;
    if again != shape {
        return Err(Error::corrupt("shape changed after a save/load round-trip"));
    }
    println!("{}: OK (version {}, {} bytes re-encoded)", path, shape.version, bytes.len());
    Ok(())
}

fn cmd_copy(args: &[&str]) -> Result<()> {
    let mut version = None;
    let mut paths = Vec::new();
    let mut iter = args.iter();
    while let Some(&arg) = iter.next() {
        if arg == "--version" {
            match iter.next().and_then(|v| v.parse::<i32>().ok()) {
                Some(v) => version = Some(v),
                None => {
                    eprintln!("Error: --version needs an integer");
                    process::exit(1);
                }
            }
        } else {
            paths.push(arg);
        }
    }
    let &[input, output] = &paths[..] else {
        eprintln!("Error: expected input and output paths");
        eprintln!("Usage: dts copy <in.dts> <out.dts> [--version N]");
        process::exit(1);
    };

    let shape = Shape::open(input)?;
    let version = version.unwrap_or(shape.version);
    shape.save(output, version)?;
    println!("Copied {} (version {}) -> {} (version {})", input, shape.version, output, version);
    Ok(())
}

fn cmd_dsq(path: &str) -> Result<()> {
    let dsq = DsqFile::open(path)?;

    println!("File: {}", path);
    println!("Version: {}", dsq.version);
    println!();
    println!("Nodes ({}):", dsq.nodes.len());
    for (i, name) in dsq.nodes.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }
    println!();
    println!("Keyframes: {} rotations, {} translations", dsq.rotations.len(), dsq.translations.len());
    println!(
        "Scales:    {} uniform, {} aligned, {} arbitrary",
        dsq.uniform_scales.len(),
        dsq.aligned_scales.len(),
        dsq.arbitrary_scale_factors.len()
    );
    println!("Ground:    {} frames", dsq.ground_translations.len());
    println!();
    println!("Sequences ({}):", dsq.sequences.len());
    for s in &dsq.sequences {
        let seq = &s.sequence;
        println!(
            "  {:<24} {:>4} keys {:>7.3}s  {}{} rot nodes",
            s.name,
            seq.num_keyframes,
            seq.duration,
            if seq.is_cyclic() { "cyclic, " } else { "" },
            seq.rotation_nodes(dsq.nodes.len()).len(),
        );
    }
    println!();
    println!("Triggers: {}", dsq.triggers.len());
    Ok(())
}
