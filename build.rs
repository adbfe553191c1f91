use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Default)]
struct ArenaSection {
    base_align: Option<u32>,
    default_size: Option<u32>,
    max_arenas: Option<usize>,
    scope_depth: Option<usize>,
}

#[derive(Deserialize, Default)]
struct Config {
    #[serde(default)]
    arena: ArenaSection,
    #[serde(default, rename = "class")]
    classes: Vec<ClassDef>,
}

#[derive(Deserialize)]
struct ClassDef {
    size: u32,
    share: f64,
}

struct ResolvedConfig {
    base_align: u32,
    default_size: u32,
    max_arenas: usize,
    scope_depth: usize,
}

fn resolve_arena(cfg: &ArenaSection) -> ResolvedConfig {
    let base_align = cfg.base_align.unwrap_or(8);
    assert!(
        base_align >= 4 && base_align.is_power_of_two(),
        "base_align ({}) must be a power of 2 and >= 4",
        base_align
    );

    let default_size = cfg.default_size.unwrap_or(500 * (1 << 20));
    assert!(default_size > 0, "default_size must be > 0");

    let max_arenas = cfg.max_arenas.unwrap_or(8);
    assert!(max_arenas >= 1, "max_arenas must be >= 1");

    let scope_depth = cfg.scope_depth.unwrap_or(64);
    assert!(scope_depth >= 1, "scope_depth must be >= 1");

    ResolvedConfig {
        base_align,
        default_size,
        max_arenas,
        scope_depth,
    }
}

fn validate_classes(defs: &[ClassDef], base_align: u32) {
    assert!(!defs.is_empty(), "SFMALLOC_CONFIG: no size classes defined");
    // The class index lives in the low nibble of a block header.
    assert!(
        defs.len() <= 15,
        "SFMALLOC_CONFIG: too many classes ({}, max 15)",
        defs.len()
    );

    let mut share_sum = 0.0;
    for (i, d) in defs.iter().enumerate() {
        assert!(
            d.size.is_power_of_two(),
            "class {}: size {} must be a power of 2",
            i,
            d.size
        );
        assert!(
            d.size % base_align == 0,
            "class {}: size {} must be a multiple of base_align ({})",
            i,
            d.size,
            base_align
        );
        assert!(
            d.share > 0.0,
            "class {}: share {} must be positive",
            i,
            d.share
        );
        if i > 0 {
            assert!(
                d.size > defs[i - 1].size,
                "class {}: size {} must be > previous size {}",
                i,
                d.size,
                defs[i - 1].size
            );
        }
        share_sum += d.share;
    }
    assert!(
        share_sum <= 1.0 + 1e-9,
        "class shares sum to {} (must be <= 1.0)",
        share_sum
    );
}

fn default_config_path() -> String {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    format!("{}/sfmalloc.toml", manifest_dir)
}

fn generate_config(cfg: &ResolvedConfig, defs: &[ClassDef], out_path: &Path) {
    let sizes: Vec<String> = defs.iter().map(|d| d.size.to_string()).collect();
    let shares: Vec<String> = defs.iter().map(|d| format!("{:?}", d.share)).collect();

    let code = format!(
        "// Auto-generated by build.rs. Do not edit.\n\n\
         pub const BASE_ALIGN: u32 = {};\n\
         pub const DEFAULT_ARENA_SIZE: u32 = {};\n\
         pub const MAX_ARENAS: usize = {};\n\
         pub const SCOPE_DEPTH: usize = {};\n\
         pub const NUM_CLASSES: usize = {};\n\
         pub const CLASS_SIZES: [u32; NUM_CLASSES] = [{}];\n\
         pub const CLASS_SHARES: [f64; NUM_CLASSES] = [{}];\n",
        cfg.base_align,
        cfg.default_size,
        cfg.max_arenas,
        cfg.scope_depth,
        defs.len(),
        sizes.join(", "),
        shares.join(", "),
    );
    fs::write(out_path, code).expect("failed to write config_gen.rs");
}

fn main() {
    println!("cargo:rerun-if-env-changed=SFMALLOC_CONFIG");

    let out_dir = env::var("OUT_DIR").unwrap();

    let config_path = env::var("SFMALLOC_CONFIG").unwrap_or_else(|_| default_config_path());
    println!("cargo:rerun-if-changed={}", config_path);
    let content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", config_path, e));

    let config: Config = toml::from_str(&content).expect("failed to parse TOML config");

    let resolved = resolve_arena(&config.arena);
    validate_classes(&config.classes, resolved.base_align);

    generate_config(
        &resolved,
        &config.classes,
        &Path::new(&out_dir).join("config_gen.rs"),
    );
}
