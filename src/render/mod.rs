//! Screen composition
//!
//! The [`Renderer`] turns a spectrum frame and the current
//! [`DisplayParameters`] into the lines shown on the terminal: an optional
//! five row control overlay followed by the spectrum plot from [`plot`].
//!
//! # Overlay
//!
//! ```text
//! ---------------={ retrogram~soapysdr }=-----------------
//! [f-F]req: 100.000 MHz   |   [r-R]ate: 1.00 Msps    |    Peak [h-H]hold: Off
//! <notice row: tuning failures, dropped stream reads>
//! [d-D]yn Range: 80 dB    |   Ref [l-L]evel:  0 dB   |   fp[s-S] : 15   |   [t-T]uning step: 0.100 M
//! --------------------------------------------------------
//! ```
//!
//! Everything is recomputed on every call since both the parameters and the
//! terminal width may change between frames.

pub mod plot;

use crate::params::DisplayParameters;

/// Rows taken by the control overlay
pub const OVERLAY_ROWS: usize = 5;

const TITLE: &str = "={ retrogram~soapysdr }=";

/// Composes overlay and plot into screen lines.
#[derive(Debug, Default, Clone)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Render `frame` for a `width` x `height` terminal.
    ///
    /// Returns at most `height` lines, each at most `width` characters.
    /// `notice` fills the spare overlay row. With the overlay hidden it takes
    /// the top row instead and the plot gives up that row.
    pub fn render(
        &self,
        frame: &[f32],
        width: usize,
        height: usize,
        params: &DisplayParameters,
        notice: Option<&str>,
    ) -> Vec<String> {
        let settings = plot::PlotSettings {
            sample_rate: params.sample_rate,
            center_frequency: params.frequency,
            dynamic_range: params.dynamic_range,
            reference_level: params.reference_level,
        };

        let mut lines = Vec::with_capacity(height);
        let plot_height = if params.show_controls {
            lines.extend(self.overlay(width, params, notice));
            height.saturating_sub(OVERLAY_ROWS)
        } else if let Some(notice) = notice {
            lines.push(notice.to_string());
            height.saturating_sub(1)
        } else {
            height
        };
        lines.extend(plot::layout(frame, width, plot_height, &settings));

        lines.truncate(height);
        for line in lines.iter_mut() {
            clip(line, width);
        }
        lines
    }

    fn overlay(
        &self,
        width: usize,
        params: &DisplayParameters,
        notice: Option<&str>,
    ) -> [String; OVERLAY_ROWS] {
        let header = "-".repeat(width.saturating_sub(TITLE.len() + 2) / 2);
        let title = format!("-{}{}-{}", header, TITLE, header);

        let status = format!(
            "[f-F]req: {:4.3} MHz   |   [r-R]ate: {:2.2} Msps    |    Peak [h-H]hold: {}",
            params.frequency / 1e6,
            params.sample_rate / 1e6,
            if params.peak_hold { "On" } else { "Off" }
        );

        let levels = format!(
            "[d-D]yn Range: {:2.0} dB    |   Ref [l-L]evel: {:2.0} dB   |   fp[s-S] : {:2.0}   |   [t-T]uning step: {:3.3} M",
            params.dynamic_range,
            params.reference_level,
            params.frame_rate,
            params.step / 1e6
        );

        [
            title,
            status,
            notice.unwrap_or_default().to_string(),
            levels,
            "-".repeat(width),
        ]
    }
}

/// Truncate `line` to at most `width` characters.
fn clip(line: &mut String, width: usize) {
    if let Some((idx, _)) = line.char_indices().nth(width) {
        line.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Vec<f32> {
        vec![-40.0; 256]
    }

    #[test]
    fn test_overlay_rows_and_plot_height() {
        let params = DisplayParameters::default();
        let lines = Renderer::new().render(&frame(), 120, 30, &params, None);
        assert_eq!(lines.len(), 30);
        assert!(lines[0].contains("={ retrogram~soapysdr }="));
        assert!(lines[1].contains("[f-F]req: 100.000 MHz"));
        assert!(lines[1].contains("[r-R]ate: 1.00 Msps"));
        assert!(lines[1].contains("Peak [h-H]hold: Off"));
        assert_eq!(lines[2], "");
        assert!(lines[3].contains("[d-D]yn Range: 80 dB"));
        assert!(lines[3].contains("fp[s-S] : 15"));
        assert!(lines[3].contains("[t-T]uning step: 0.100 M"));
        assert_eq!(lines[4], "-".repeat(120));
    }

    #[test]
    fn test_title_is_centered_to_width() {
        let params = DisplayParameters::default();
        let lines = Renderer::new().render(&frame(), 80, 30, &params, None);
        let title = &lines[0];
        assert_eq!(title.len(), 80);
        assert!(title.starts_with("----"));
        assert!(title.ends_with("----"));
    }

    #[test]
    fn test_hidden_controls_use_full_height() {
        let params = DisplayParameters {
            show_controls: false,
            ..Default::default()
        };
        let lines = Renderer::new().render(&frame(), 80, 24, &params, None);
        assert_eq!(lines.len(), 24);
        assert!(!lines.iter().any(|l| l.contains("retrogram")));
        assert!(lines[22].contains("dBfs"));
    }

    #[test]
    fn test_notice_takes_top_row_when_controls_hidden() {
        let params = DisplayParameters {
            show_controls: false,
            ..Default::default()
        };
        let lines =
            Renderer::new().render(&frame(), 80, 24, &params, Some("setFrequency failed"));
        assert_eq!(lines.len(), 24);
        assert_eq!(lines[0], "setFrequency failed");
        assert!(!lines.iter().any(|l| l.contains("retrogram")));
        // Plot shifted down by one row, frequency labels on the last row.
        assert!(!lines[21].contains("dBfs"));
        assert!(lines[22].contains("dBfs"));
    }

    #[test]
    fn test_notice_is_shown() {
        let params = DisplayParameters::default();
        let lines =
            Renderer::new().render(&frame(), 100, 30, &params, Some("setFrequency failed"));
        assert_eq!(lines[2], "setFrequency failed");
    }

    #[test]
    fn test_narrow_short_terminal_is_clipped() {
        let params = DisplayParameters {
            peak_hold: true,
            ..Default::default()
        };
        let lines = Renderer::new().render(&frame(), 10, 3, &params, None);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));

        assert!(Renderer::new().render(&frame(), 0, 0, &params, None).is_empty());
    }
}
