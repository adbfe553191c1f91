//! Build-time configuration, generated by build.rs from `sfmalloc.toml`
//! (override the path with the `SFMALLOC_CONFIG` environment variable).

include!(concat!(env!("OUT_DIR"), "/config_gen.rs"));

// The class index is packed into the low nibble of `index_and_class`.
const _: () = assert!(NUM_CLASSES <= 15);
const _: () = assert!(BASE_ALIGN.is_power_of_two());
