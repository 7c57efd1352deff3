use crate::error::Result;
use crate::schema::ExtractionSchema;
use crate::schema::generator::{FIELD_INSTRUCTIONS, SchemaGenerator};
use std::fs;
use std::path::Path;

/// Load the cached schema at `cache_path`, or generate one from `sample_html`
/// when there is no cache or `force_regenerate` is set.
///
/// The schema is validated before it is returned, so a harvest never starts
/// with a schema that cannot produce every required field. A generated schema
/// is written to `cache_path` before validation, so an incomplete one can be
/// fixed by hand instead of regenerated.
pub fn obtain_schema(
    sample_html: &str,
    cache_path: &Path,
    force_regenerate: bool,
    generator: &dyn SchemaGenerator,
) -> Result<ExtractionSchema> {
    if cache_path.exists() && !force_regenerate {
        log::info!("Loading cached extraction schema from {}", cache_path.display());
        let schema = ExtractionSchema::from_json(&fs::read_to_string(cache_path)?)?;
        schema.validate()?;
        return Ok(schema);
    }

    let schema = generator.generate(sample_html, FIELD_INSTRUCTIONS)?;

    if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(cache_path, schema.to_json_pretty()?)?;
    log::info!("Generated extraction schema saved to {}", cache_path.display());

    schema.validate()?;
    Ok(schema)
}
