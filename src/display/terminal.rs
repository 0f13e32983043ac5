// src/display/terminal.rs
//! Terminal-based display implementation

use crate::{
    error::{MapError, Result},
    gps::GpsData,
    marker::{Marker, MarkerStyle},
    viewer::{FixedTicker, Viewer},
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::atomic::Ordering,
    time::{Duration, Instant},
};
use tokio::time::sleep;

pub struct TerminalDisplay {
    ticker: FixedTicker,
    frame_interval: Duration,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            ticker: FixedTicker::new(30),
            frame_interval: Duration::from_millis(250),
        }
    }

    /// Run the update/render loop until the viewer stops or Ctrl+C
    pub async fn run(&mut self, viewer: &mut Viewer) -> Result<()> {
        let mut stdout = io::stdout();
        self.run_on(&mut stdout, viewer).await?;
        println!("\nShutting down...");
        Ok(())
    }

    /// Loop on `out`. The cursor and line wrap are restored on every exit path.
    async fn run_on(&mut self, out: &mut impl Write, viewer: &mut Viewer) -> Result<()> {
        execute!(out, Hide, DisableLineWrap).map_err(MapError::Io)?;
        let result = self.render_loop(out, viewer).await;
        let restored = execute!(out, Show, EnableLineWrap).map_err(MapError::Io);
        result.and(restored)
    }

    async fn render_loop(&mut self, out: &mut impl Write, viewer: &mut Viewer) -> Result<()> {
        // Set up Ctrl+C handler
        let running = viewer.running();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                running.store(false, Ordering::Relaxed);
            }
        });

        let step = self.ticker.step().as_secs_f64();
        let mut last_frame = Instant::now();

        while viewer.is_running() {
            let now = Instant::now();
            for _ in 0..self.ticker.advance(now - last_frame) {
                viewer.update(step);
            }
            last_frame = now;

            execute!(out, Clear(ClearType::All), MoveTo(0, 0)).map_err(MapError::Io)?;
            self.render_display(out, viewer)?;
            out.flush().map_err(MapError::Io)?;

            sleep(self.frame_interval).await;
        }
        Ok(())
    }

    /// Render the viewer state to the terminal
    fn render_display(&self, stdout: &mut impl Write, viewer: &Viewer) -> Result<()> {
        // Header
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("OSM Viewer - OpenStreetMap tiles with live GPS"),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )
        .map_err(MapError::Io)?;

        self.render_tileset_section(stdout, viewer)?;

        if viewer.has_gps() {
            self.render_gps_section(stdout, viewer.gps_data(), viewer.gps_marker())?;
        }

        self.render_marker_section(stdout, viewer)?;

        // Footer
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to exit"),
            Print("\n"),
            ResetColor
        )
        .map_err(MapError::Io)?;

        Ok(())
    }

    fn render_tileset_section(&self, stdout: &mut impl Write, viewer: &Viewer) -> Result<()> {
        let tileset = viewer.tileset();
        let range = tileset.range();
        let (nw, se) = (tileset.min_coord(), tileset.max_coord());

        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("TILESET:\n"),
            ResetColor,
            Print(format!("  Zoom:      {:>12}\n", range.zoom)),
            Print(format!(
                "  Tiles:     {:>12}\n",
                format!("{}/{}", tileset.len(), tileset.requested())
            )),
            Print(format!(
                "  Range:     x {}..={}  y {}..={}\n",
                range.min.x, range.max.x, range.min.y, range.max.y
            )),
            Print(format!("  North-west: {:>11.6}°, {:>11.6}°\n", nw.lat, nw.lng)),
            Print(format!("  South-east: {:>11.6}°, {:>11.6}°\n", se.lat, se.lng)),
            Print(format!(
                "  Size:      {:>6.0} x {:.0} px\n\n",
                tileset.size().x,
                -tileset.size().y
            ))
        )
        .map_err(MapError::Io)?;

        if !tileset.is_complete() {
            execute!(
                stdout,
                SetForegroundColor(Color::Red),
                Print(format!(
                    "  {} tile(s) missing, see log\n\n",
                    tileset.requested().saturating_sub(tileset.len() as u64)
                )),
                ResetColor
            )
            .map_err(MapError::Io)?;
        }

        Ok(())
    }

    fn render_gps_section(&self, stdout: &mut impl Write, data: &GpsData, marker: &Marker) -> Result<()> {
        let status_color = if data.available && data.is_recent() {
            Color::Green
        } else {
            Color::Red
        };

        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("GPS:\n"),
            ResetColor,
            SetForegroundColor(status_color),
            Print(format!("  {}\n", if data.available { "FIX" } else { "NO FIX" })),
            ResetColor
        )
        .map_err(MapError::Io)?;

        for line in data.info().lines() {
            execute!(stdout, Print(format!("  {}\n", line))).map_err(MapError::Io)?;
        }

        if !marker.hidden {
            execute!(
                stdout,
                Print(format!("  map pos: ({:.1}, {:.1}) px\n", marker.pos.x, marker.pos.y))
            )
            .map_err(MapError::Io)?;
        }

        execute!(stdout, Print("\n")).map_err(MapError::Io)?;
        Ok(())
    }

    fn render_marker_section(&self, stdout: &mut impl Write, viewer: &Viewer) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Magenta),
            Print("MARKERS:\n"),
            ResetColor
        )
        .map_err(MapError::Io)?;

        if viewer.markers().is_empty() {
            execute!(stdout, Print("  none\n")).map_err(MapError::Io)?;
        }

        for (i, marker) in viewer.markers().iter().enumerate() {
            let kind = match &marker.style {
                MarkerStyle::Gps { .. } => "gps".to_string(),
                MarkerStyle::Shape { kind, .. } => format!("{:?}", kind).to_lowercase(),
            };
            execute!(
                stdout,
                Print(format!(
                    "  #{:<2} {:<9} {:>11.6}°, {:>11.6}°  -> ({:>7.1}, {:>7.1}) px{}\n",
                    i,
                    kind,
                    marker.coord.lat,
                    marker.coord.lng,
                    marker.pos.x,
                    marker.pos.y,
                    if marker.route.is_some() { "  [moving]" } else { "" }
                ))
            )
            .map_err(MapError::Io)?;
        }

        execute!(stdout, Print("\n")).map_err(MapError::Io)?;
        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::map::{TileIndex, TileRange, Tileset};

    /// Accepts everything except a screen clear
    #[derive(Default)]
    struct NoClearWriter {
        out: Vec<u8>,
    }

    impl Write for NoClearWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.windows(2).any(|w| w == b"2J") {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample_tileset() -> Tileset {
        Tileset::new(
            Vec::new(),
            TileRange {
                zoom: 17,
                min: TileIndex::new(41700, 74889),
                max: TileIndex::new(41704, 74893),
            },
        )
    }

    #[tokio::test]
    async fn test_cursor_restored_after_render_error() {
        let mut viewer = Viewer::from_config(&ViewerConfig::default(), sample_tileset());
        let mut out = NoClearWriter::default();

        let result = TerminalDisplay::new().run_on(&mut out, &mut viewer).await;

        assert!(matches!(result, Err(MapError::Io(_))));
        let text = String::from_utf8_lossy(&out.out);
        let hidden = text.find("?25l").unwrap();
        let shown = text.rfind("?25h").unwrap();
        assert!(shown > hidden);
        assert!(text.contains("?7h"));
    }

    #[test]
    fn test_render_display() {
        let viewer = Viewer::from_config(&ViewerConfig::default(), sample_tileset());
        let mut out = Vec::new();

        TerminalDisplay::new().render_display(&mut out, &viewer).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("TILESET:"));
        assert!(text.contains("0/25"));
        assert!(text.contains("25 tile(s) missing"));
        assert!(text.contains("triangle"));
        assert!(text.contains("[moving]"));
        assert!(!text.contains("GPS:"));
    }
}
