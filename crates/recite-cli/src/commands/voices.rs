use recite_core::error::ReciteError;
use recite_core::playback::espeak::load_voices;
use recite_core::settings::Settings;

pub async fn run(settings: &Settings) -> Result<(), ReciteError> {
    let voices = load_voices(&settings.speech.espeak).await?;
    let selected = settings.speech.voice.as_deref();

    if voices.is_empty() {
        println!("No voices reported by {}.", settings.speech.espeak);
        return Ok(());
    }

    for voice in &voices {
        let marker = if Some(voice.name.as_str()) == selected {
            "*"
        } else {
            " "
        };
        println!("{marker} {voice}");
    }
    Ok(())
}
