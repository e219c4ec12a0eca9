use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::{config::OutputFormat, models::board::Board};

/// Draws the dashboard somewhere a person can see it.
pub trait Renderer {
    fn render(&mut self, board: &Board) -> Result<()>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, board: &Board) -> Result<()> {
        (**self).render(board)
    }
}

/// Pick the stdout renderer for an output format.
pub fn stdout_renderer(format: OutputFormat) -> Box<dyn Renderer + Send> {
    match format {
        OutputFormat::Plain => Box::new(PlainRenderer::new(io::stdout())),
        OutputFormat::Json => Box::new(JsonRenderer::new(io::stdout())),
    }
}

/// One status line per redraw:
/// `co2ppm: 812 PPM | temperature: 21.4°C | humidity: 55%`
pub struct PlainRenderer<W: Write> {
    out: W,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn render(&mut self, board: &Board) -> Result<()> {
        let line = board
            .iter()
            .map(|(element, text)| format!("{}: {}", element, text))
            .collect::<Vec<_>>()
            .join(" | ");
        writeln!(self.out, "{}", line).context("Failed to write status line")?;
        self.out.flush().context("Failed to flush status line")
    }
}

/// One JSON object per redraw, keyed by element id.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, board: &Board) -> Result<()> {
        serde_json::to_writer(&mut self.out, board).context("Failed to encode board")?;
        writeln!(self.out).context("Failed to write board")?;
        self.out.flush().context("Failed to flush board")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{display_update::DisplayUpdate, element::ElementId};

    fn loaded_board() -> Board {
        let mut board = Board::default();
        board.on_load();
        for (element, text) in [
            (ElementId::Humidity, "55%"),
            (ElementId::Temperature, "21.4°C"),
            (ElementId::Co2Ppm, "812 PPM"),
        ] {
            board.apply(&DisplayUpdate {
                element,
                text: text.into(),
            });
        }
        board
    }

    #[test]
    fn test_plain_renderer_writes_status_line() {
        let mut renderer = PlainRenderer::new(Vec::new());
        renderer.render(&loaded_board()).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            output,
            "co2ppm: 812 PPM | temperature: 21.4°C | humidity: 55%\n"
        );
    }

    #[test]
    fn test_plain_renderer_shows_loading_state() {
        let mut board = Board::default();
        board.on_load();
        let mut renderer = PlainRenderer::new(Vec::new());
        renderer.render(&board).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output, "co2ppm: … | temperature: … | humidity: …\n");
    }

    #[test]
    fn test_json_renderer_writes_one_object_per_redraw() {
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.render(&loaded_board()).unwrap();
        renderer.render(&Board::default()).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["co2ppm"], "812 PPM");
        assert_eq!(first["temperature"], "21.4°C");
        assert_eq!(first["humidity"], "55%");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["humidity"], "n/a");
    }
}
