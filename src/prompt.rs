use crate::record::ContentRecord;

pub const NEGATIVE_PROMPT: &str =
    "text, watermark, signature, blurry, low quality, distorted, ugly, amateur, cartoon, anime";

/// Image-generation prompt built straight from the English record.
pub fn art_prompt(record: &ContentRecord) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_default();
    let title = record
        .title
        .clone()
        .unwrap_or_else(|| "Human Design Gate".to_string());

    format!(
        "Mystical spiritual artwork for Human Design {title}.

Theme: {theme}
Energy essence: {essence}
Line expression: {line}

Art style requirements:
- Sacred geometry patterns and cosmic mandala elements
- Deep purple, golden light, celestial blue color palette
- I Ching hexagram subtle integration
- Ethereal flowing energy lines and particles
- Mystical transformation and enlightenment mood
- Professional poster composition with mystical border
- High detail, cinematic lighting, 4K quality

Additional elements: stars, nebula, sacred symbols, golden ratio spirals",
        title = title,
        theme = field(&record.subtitle),
        essence = field(&record.lead),
        line = field(&record.line_title),
    )
}

/// Text written next to the dated documents.
pub fn prompt_artifact(record: &ContentRecord) -> String {
    format!(
        "{}\n\nNegative prompt: {}\n",
        art_prompt(record),
        NEGATIVE_PROMPT
    )
}
