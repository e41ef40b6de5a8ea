use clap::Parser;
use std::path::PathBuf;

/// Default model. "Flash" is the cheaper image model; the Pro preview also
/// works but rate-limits much sooner.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Creativity (0.0 to 1.0). Low values give faithful restoration, which is
/// what video frames need to avoid jitter between neighbours; high values
/// hallucinate detail and are only usable for single stills.
pub const DEFAULT_TEMPERATURE: f32 = 0.15;

/// Base endpoint for the Gemini generateContent API.
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Per-frame instruction sent alongside the image payload.
pub const FRAME_INSTRUCTION: &str = "Upscale this to 4K.";

/// Fixed system instruction establishing the remastering behaviour.
pub const SYSTEM_PROMPT: &str = "\
You are a professional film remastering AI.
Your task is to upscale the input image to high-fidelity 4K resolution.
1. DENOISE: Remove compression artifacts and JPEG noise.
2. SHARPEN: Restore skin texture and edge details naturally.
3. FAITHFUL: Do NOT change the person's identity, facial expression, or clothing details.
4. OUTPUT: Return only the high-resolution image.
";

#[derive(Parser, Clone)]
#[command(version, about = "AI video frame upscaler", long_about = None)]
pub struct Config {
    /// Input folder of frames
    #[arg(short, long)]
    pub input_dir: PathBuf,

    /// Output folder
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Model name (e.g. gemini-2.0-flash-exp)
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Creativity/Temperature (0.0 - 1.0)
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE, value_parser = check_temperature)]
    pub temperature: f32,
}

fn check_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a valid temperature"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{value} is out of range. Expected 0.0 - 1.0"));
    }
    Ok(value)
}
