//! Subcommands of the `inkwise` binary.

use inkwise_core::shapes::SerializableColor;
use inkwise_core::{
    AssistConfig, AssistError, Canvas, CodecError, ConfigError, DocumentContent, DocumentStore,
    EditingSession, EditorConfig, FileDocumentStore, GeminiBackend, Notice, SessionError,
    ShapePreset, SnapshotFormat, StorageError, ToolMode, Topic,
};
use inkwise_render::TinySkiaRasterizer;
use kurbo::Point;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const USAGE: &str = "\
usage:
  inkwise export <document.json> <output.png|output.jpg>
  inkwise hint <document.json> [topic] [question...]
  inkwise demo <output.json> [store-dir]";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Assist(#[from] AssistError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type AppResult<T> = Result<T, AppError>;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Render a stored board to an image file.
    Export { input: PathBuf, output: PathBuf },
    /// Ask the assistant about a stored board.
    Hint {
        input: PathBuf,
        topic: Topic,
        text: Option<String>,
    },
    /// Draw a sample board, save it and write its document JSON.
    Demo {
        output: PathBuf,
        store: Option<PathBuf>,
    },
}

impl Command {
    /// Parse arguments, program name excluded.
    pub fn parse<I>(args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let usage = || AppError::Usage(USAGE.to_string());

        match args.next().as_deref() {
            Some("export") => {
                let input = args.next().ok_or_else(usage)?;
                let output = args.next().ok_or_else(usage)?;
                Ok(Command::Export {
                    input: input.into(),
                    output: output.into(),
                })
            }
            Some("hint") => {
                let input = args.next().ok_or_else(usage)?;
                let rest: Vec<String> = args.collect();
                // A leading word naming a topic selects it; everything else is the question.
                let (topic, words) = match rest.split_first() {
                    Some((first, tail)) => match first.parse::<Topic>() {
                        Ok(topic) => (topic, tail),
                        Err(_) => (Topic::default(), rest.as_slice()),
                    },
                    None => (Topic::default(), rest.as_slice()),
                };
                let text = (!words.is_empty()).then(|| words.join(" "));
                Ok(Command::Hint {
                    input: input.into(),
                    topic,
                    text,
                })
            }
            Some("demo") => {
                let output = args.next().ok_or_else(usage)?;
                Ok(Command::Demo {
                    output: output.into(),
                    store: args.next().map(PathBuf::from),
                })
            }
            _ => Err(usage()),
        }
    }

    pub async fn run(self) -> AppResult<()> {
        match self {
            Command::Export { input, output } => export(&input, &output),
            Command::Hint { input, topic, text } => hint(&input, topic, text.as_deref()).await,
            Command::Demo { output, store } => {
                let store = match store {
                    Some(path) => FileDocumentStore::new(path)?,
                    None => FileDocumentStore::default_location()?,
                };
                let id = demo(&output, &store).await?;
                println!("{id}");
                Ok(())
            }
        }
    }
}

fn new_session(config: EditorConfig) -> EditingSession<Canvas> {
    let canvas = Canvas::new(&config).with_rasterizer(Arc::new(TinySkiaRasterizer::new()));
    EditingSession::new(canvas, config)
}

fn load_session(input: &Path, config: EditorConfig) -> AppResult<EditingSession<Canvas>> {
    let json = std::fs::read_to_string(input)?;
    let content = DocumentContent::from_json(&json)?;
    let mut session = new_session(config);
    session.load_content(&content)?;
    Ok(session)
}

fn format_for(path: &Path) -> SnapshotFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            SnapshotFormat::Jpeg
        }
        _ => SnapshotFormat::Png,
    }
}

fn log_notices(notices: Vec<Notice>) {
    for notice in notices {
        log::info!("{}", notice);
    }
}

/// Render `input` into `output`, picking the format from the extension.
pub fn export(input: &Path, output: &Path) -> AppResult<()> {
    let config = EditorConfig {
        snapshot_format: format_for(output),
        ..EditorConfig::default()
    };
    let mut session = load_session(input, config)?;
    let snapshot = session.export_snapshot()?;
    std::fs::write(output, &snapshot.bytes)?;
    log::info!(
        "Exported {} ({} bytes) to {}",
        snapshot.format.mime_type(),
        snapshot.bytes.len(),
        output.display()
    );
    Ok(())
}

/// Send the board to the assistant and print the reply.
pub async fn hint(input: &Path, topic: Topic, text: Option<&str>) -> AppResult<()> {
    let backend = GeminiBackend::new(AssistConfig::from_env()?)?;
    let mut session = load_session(input, EditorConfig::default())?;
    session.set_topic(topic);
    session.set_panel_visible(true);

    let job = session.prepare_assist(text)?;
    let outcome = job.run(&backend).await;
    let result = session.finish_assist(outcome);
    log_notices(session.drain_notices());
    result?;

    if let Some(turn) = session.conversation().last() {
        println!("{}", turn.text);
    }
    Ok(())
}

/// Draw a sample board through the session, save it to `store` and write
/// its document JSON to `output`. Returns the stored document id.
pub async fn demo(output: &Path, store: &dyn DocumentStore) -> AppResult<String> {
    let mut session = new_session(EditorConfig::default());
    draw_sample(&mut session);
    session.sign_in("local");

    let job = session.prepare_save()?;
    std::fs::write(output, job.content().to_json()?)?;

    let outcome = job.run(store).await;
    let id = session.finish_save(outcome);
    log_notices(session.drain_notices());
    Ok(id?)
}

fn draw_sample(session: &mut EditingSession<Canvas>) {
    session.insert_shape(ShapePreset::Square);
    session.insert_shape(ShapePreset::Circle);
    session.insert_text();

    session.select_tool(ToolMode::Pencil);
    session.set_pen_color(SerializableColor::new(37, 99, 235, 255));
    session.set_pen_width(4.0);
    session.begin_stroke(Point::new(40.0, 400.0));
    for step in 1..=20 {
        let x = 40.0 + step as f64 * 15.0;
        let y = 400.0 - (step as f64 * 0.5).sin() * 40.0;
        session.extend_stroke(Point::new(x, y));
    }
    session.end_stroke();
    session.select_tool(ToolMode::Cursor);
}
