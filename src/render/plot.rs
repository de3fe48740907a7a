//! ASCII spectrum plot
//!
//! Maps a [`SpectrumFrame`](crate::spectrum::SpectrumFrame) onto a text
//! canvas: a column of amplitude labels on the left, the plot area, a rule
//! carrying the `dBfs` unit label, and a row of frequency labels in MHz.
//!
//! ```text
//! -20   |        !
//!       |       :|.
//! -60   |......:|||:.......
//!  dBfs +------------------
//!         99.8MHz 100MHz 100.2MHz
//! ```

/// Width of the amplitude label gutter
pub const AMPLITUDE_LABEL_WIDTH: usize = 6;

/// Rows taken by the unit rule and the frequency labels
const FOOTER_ROWS: usize = 2;

/// Symbols for a partially filled cell, from lowest to full
const SYMBOLS: [char; 4] = ['.', ':', '!', '|'];

/// Smallest dynamic range the plot will scale to, in dB
const MIN_DYNAMIC_RANGE: f32 = 1.0;

/// Display settings the plot is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotSettings {
    pub sample_rate: f64,
    pub center_frequency: f64,
    pub dynamic_range: f32,
    pub reference_level: f32,
}

/// Round `num` to the nearest 1, 2, 5 or 10 times a power of ten.
pub fn clean_number(num: f64) -> f64 {
    if num == 0.0 || !num.is_finite() {
        return 0.0;
    }
    let pow10 = 10f64.powi(num.abs().log10().floor() as i32);
    let norm = num.abs() / pow10;
    let clean = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .min_by(|a: &f64, b: &f64| (norm - a).abs().total_cmp(&(norm - b).abs()))
        .unwrap_or(1.0);
    num.signum() * clean * pow10
}

/// Format a value in MHz without trailing zeros.
fn format_mhz(hz: f64) -> String {
    let text = format!("{:.3}", hz / 1e6);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    let text = if text == "-0" { "0" } else { text };
    format!("{}MHz", text)
}

struct Canvas {
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![vec![' '; width]; height],
        }
    }

    fn put_str(&mut self, row: usize, col: usize, text: &str) {
        if let Some(line) = self.cells.get_mut(row) {
            for (i, ch) in text.chars().enumerate() {
                if let Some(cell) = line.get_mut(col + i) {
                    *cell = ch;
                }
            }
        }
    }

    fn into_lines(self) -> Vec<String> {
        self.cells
            .into_iter()
            .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
            .collect()
    }
}

/// Draw `frame` onto a `width` x `height` text block.
///
/// Always returns exactly `height` lines, none longer than `width`
/// characters. A canvas too small for the plot gets a clipped notice
/// instead of a plot.
pub fn layout(frame: &[f32], width: usize, height: usize, settings: &PlotSettings) -> Vec<String> {
    let min_width = AMPLITUDE_LABEL_WIDTH + 2;
    let min_height = FOOTER_ROWS + 2;
    if width < min_width || height < min_height || frame.is_empty() {
        let mut lines = vec![String::new(); height];
        if let Some(first) = lines.first_mut() {
            *first = "terminal too small".chars().take(width).collect();
        }
        return lines;
    }

    let plot_w = width - AMPLITUDE_LABEL_WIDTH - 1;
    let plot_h = height - FOOTER_ROWS;
    let plot_x = AMPLITUDE_LABEL_WIDTH + 1;
    let dyn_rng = settings.dynamic_range.max(MIN_DYNAMIC_RANGE);
    let ref_lvl = settings.reference_level;
    let floor = ref_lvl - dyn_rng;

    let mut canvas = Canvas::new(width, height);

    // Plot area: row 0 is the top, z counts up from the bottom.
    let bins = frame.len();
    for b in 0..plot_w {
        let start = (b * bins / plot_w).min(bins - 1);
        let stop = ((b + 1) * bins / plot_w).clamp(start + 1, bins);
        let val = frame[start..stop]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let scaled = (val - floor) * (plot_h - 1) as f32 / dyn_rng;

        for z in 0..plot_h {
            let fill = scaled - z as f32;
            let symbol = if fill > 1.0 {
                SYMBOLS[SYMBOLS.len() - 1]
            } else if fill > 0.0 {
                SYMBOLS[((fill * SYMBOLS.len() as f32) as usize).min(SYMBOLS.len() - 1)]
            } else {
                continue;
            };
            canvas.cells[plot_h - 1 - z][plot_x + b] = symbol;
        }
    }

    for row in 0..plot_h {
        canvas.cells[row][AMPLITUDE_LABEL_WIDTH] = '|';
    }

    // Amplitude labels on clean dB steps.
    if plot_h > 1 {
        let db_step = clean_number(dyn_rng as f64 / (plot_h - 1) as f64 * 5.0);
        if db_step > 0.0 {
            let first = (floor as f64 / db_step) as i64;
            let last = (ref_lvl as f64 / db_step) as i64;
            for k in first..=last {
                let db = k as f64 * db_step;
                let z = ((db - floor as f64) * (plot_h - 1) as f64 / dyn_rng as f64).round();
                if z < 0.0 || z as usize >= plot_h {
                    continue;
                }
                let label: String = format!("{}", db).chars().take(AMPLITUDE_LABEL_WIDTH).collect();
                canvas.put_str(plot_h - 1 - z as usize, 0, &label);
            }
        }
    }

    // Unit rule.
    let rule_row = plot_h;
    canvas.put_str(rule_row, 1, "dBfs");
    canvas.cells[rule_row][AMPLITUDE_LABEL_WIDTH] = '+';
    for col in plot_x..width {
        canvas.cells[rule_row][col] = '-';
    }

    // Frequency labels centred on their columns.
    let rate = settings.sample_rate;
    if rate > 0.0 && rate.is_finite() {
        let f_step = clean_number(rate / plot_w as f64 * 10.0);
        if f_step > 0.0 {
            let half = rate / 2.0;
            let first = (-half / f_step) as i64;
            let last = (half / f_step) as i64;
            let mut next_free = 0usize;
            for k in first..=last {
                let offset = k as f64 * f_step;
                let b = ((offset + half) * plot_w as f64 / rate).round() as usize;
                let label = format_mhz(offset + settings.center_frequency);
                let len = label.chars().count();
                if b < len / 2 || b + len - len / 2 >= plot_w {
                    continue;
                }
                let start = b - len / 2;
                if start < next_free {
                    continue;
                }
                canvas.put_str(rule_row + 1, plot_x + start, &label);
                next_free = start + len + 1;
            }
        }
    }

    canvas.into_lines()
}
