//! ge-content CLI - Inspect engine content files.

use std::env;
use std::path::Path;

use ge_content::content::{Animation, FontData, Mesh, Skeleton};
use ge_content::core::{Named, ObjectName, XmlNode};
use ge_content::util::{ByteReader, Error, Result};
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing_subscriber::EnvFilter;

const BUILD_DATE: &str = env!("GE_CONTENT_BUILD_DATE");
const BUILD_TIME: &str = env!("GE_CONTENT_BUILD_TIME");

/// Summary of one inspected file.
#[derive(Debug, Serialize)]
struct Summary {
    kind: &'static str,
    name: String,
    details: Map<String, JsonValue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "off",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    // RUST_LOG wins unless a flag was given explicitly.
    let filter = if verbosity == Verbosity::Normal {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()))
    } else {
        EnvFilter::new(verbosity.directive())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map_or("ge-content", String::as_str);

    let mut verbosity = Verbosity::Normal;
    let mut as_json = false;
    let mut positional: Vec<&str> = Vec::new();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Debug,
            "-vv" | "--trace" => verbosity = Verbosity::Trace,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "--json" => as_json = true,
            "-V" | "--version" => {
                println!("ge-content {} (built {} {})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_TIME);
                return;
            }
            _ => positional.push(arg),
        }
    }
    init_logging(verbosity);

    match positional.as_slice() {
        ["info" | "i", path] => {
            if let Err(e) = cmd_info(path, as_json) {
                eprintln!("Failed to inspect {}: {}", path, e);
                std::process::exit(1);
            }
        }
        [] | ["help" | "h"] => print_usage(prog),
        _ => {
            print_usage(prog);
            std::process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    println!("ge-content CLI - Inspect engine content files");
    println!();
    println!("Usage: {} [options] info <file>", prog);
    println!();
    println!("Supported files:");
    println!("  *.mesh.ge        Mesh");
    println!("  *.animation.ge   Skeletal animation");
    println!("  *.skeleton.ge    Skeleton (binary)");
    println!("  *.skeleton.xml   Skeleton (XML)");
    println!("  *.fnt            Font character set descriptor");
    println!();
    println!("Options:");
    println!("  --json         Print the summary as JSON");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Suppress log output");
    println!("  -V, --version  Show version and build date");
}

fn cmd_info(path: &str, as_json: bool) -> Result<()> {
    tracing::info!("inspecting {}", path);
    let summary = inspect(Path::new(path))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}: {}", summary.kind, summary.name);
        for (key, value) in &summary.details {
            println!("  {}: {}", key, value);
        }
    }
    Ok(())
}

/// Split `dir/Name.mesh.ge` into `("Name", "mesh.ge")`.
fn split_name(path: &Path) -> Option<(&str, &str)> {
    path.file_name()?.to_str()?.split_once('.')
}

fn inspect(path: &Path) -> Result<Summary> {
    let (stem, extension) =
        split_name(path).ok_or_else(|| Error::invalid(format!("no file extension in {}", path.display())))?;
    let name = ObjectName::new(stem);
    let bytes = std::fs::read(path)?;
    tracing::debug!(bytes = bytes.len(), extension, "read file");

    let mut details = Map::new();
    let kind = match extension {
        Mesh::EXTENSION => {
            let mesh = Mesh::from_bytes(name, ObjectName::EMPTY, &bytes)?;
            details.insert("vertices".into(), json!(mesh.vertex_count()));
            details.insert("triangles".into(), json!(mesh.triangle_count()));
            details.insert("textured".into(), json!(mesh.uses_texture()));
            details.insert("skinned".into(), json!(mesh.is_skinned()));
            "Mesh"
        }
        Animation::EXTENSION => {
            let animation = Animation::from_bytes(name, &bytes)?;
            details.insert("key_frames".into(), json!(animation.key_frame_count()));
            details.insert("bones".into(), json!(animation.bone_count()));
            details.insert("duration".into(), json!(animation.duration()));
            "Animation"
        }
        Skeleton::BINARY_EXTENSION | Skeleton::XML_EXTENSION => {
            let skeleton = if extension == Skeleton::XML_EXTENSION {
                Skeleton::from_xml(name, &XmlNode::parse_bytes(&bytes)?)?
            } else {
                Skeleton::read(name, &mut ByteReader::new(&bytes))?
            };
            details.insert("bones".into(), json!(skeleton.bone_count()));
            if let Some(root) = skeleton.root() {
                details.insert("root".into(), json!(root.name().to_name_string()));
            }
            "Skeleton"
        }
        "fnt" => {
            let data = FontData::from_fnt(&XmlNode::parse_bytes(&bytes)?)?;
            details.insert("texture".into(), json!([data.texture_width, data.texture_height]));
            details.insert("base".into(), json!(data.base));
            details.insert("line_height".into(), json!(data.line_height));
            details.insert("characters".into(), json!(data.chars.len()));
            details.insert("kerning_pairs".into(), json!(data.kernings.len()));
            "Font"
        }
        other => return Err(Error::invalid(format!("unsupported file type: .{}", other))),
    };

    Ok(Summary {
        kind,
        name: stem.to_owned(),
        details,
    })
}
