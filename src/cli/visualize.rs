use colored::*;
use std::collections::BTreeMap;

/// Create an ASCII histogram
pub fn ascii_histogram(data: &[(String, usize)], width: usize, use_color: bool) -> String {
    let mut output = String::new();

    if data.is_empty() {
        return output;
    }

    let max_value = data.iter().map(|(_, v)| *v).max().unwrap_or(1).max(1);
    let max_label_len = data.iter().map(|(s, _)| s.len()).max().unwrap_or(0);

    for (label, value) in data {
        let percentage = (*value as f64 / max_value as f64) * 100.0;
        let bar_width = (((percentage / 100.0) * width as f64) as usize).min(width);

        let bar = if use_color {
            match percentage as u32 {
                0..=25 => "█".repeat(bar_width).red().to_string(),
                26..=50 => "█".repeat(bar_width).yellow().to_string(),
                51..=75 => "█".repeat(bar_width).blue().to_string(),
                _ => "█".repeat(bar_width).green().to_string(),
            }
        } else {
            "█".repeat(bar_width)
        };

        let empty = "░".repeat(width - bar_width);

        output.push_str(&format!(
            "{:>width$} {}{} {:>6}\n",
            label,
            bar,
            empty,
            value,
            width = max_label_len
        ));
    }

    output
}

/// Count clusters per size bucket. Sizes up to 3 get their own row, larger
/// ones are grouped by powers of two.
pub fn cluster_size_distribution(sizes: &[usize]) -> Vec<(String, usize)> {
    let mut buckets: BTreeMap<usize, (String, usize)> = BTreeMap::new();
    for &size in sizes {
        let (lower, label) = match size {
            0..=3 => (size, size.to_string()),
            _ => {
                let lower = 1usize << (usize::BITS - 1 - size.leading_zeros());
                (lower, format!("{}-{}", lower, lower * 2 - 1))
            }
        };
        buckets.entry(lower).or_insert((label, 0)).1 += 1;
    }
    buckets.into_values().collect()
}

/// Shade a square matrix of values in `[0, 1]`, one character per cell,
/// sampled down to at most `max_side` rows and columns.
pub fn heat_map(data: &[Vec<f64>], max_side: usize, use_color: bool) -> String {
    if data.is_empty() || max_side == 0 {
        return String::new();
    }

    let blocks = [' ', '░', '▒', '▓', '█'];
    let side = data.len().min(max_side);
    let step = data.len() as f64 / side as f64;
    let mut output = String::new();

    for i in 0..side {
        let row = &data[(i as f64 * step) as usize];
        for j in 0..side {
            let value = row[(j as f64 * step) as usize].clamp(0.0, 1.0);
            let idx = ((value * 4.0).round() as usize).min(4);
            let ch = blocks[idx].to_string();
            if use_color {
                let shaded = match idx {
                    0 => ch.blue(),
                    1 => ch.cyan(),
                    2 => ch.yellow(),
                    3 => ch.magenta(),
                    _ => ch.red(),
                };
                output.push_str(&shaded.to_string());
            } else {
                output.push_str(&ch);
            }
        }
        output.push('\n');
    }

    output
}
