//! Text oscilloscope for visualization windows.

/// Draw a window of screen-space points as `rows` lines of `columns` characters.
///
/// Points are averaged into columns; `height` is the screen height the
/// points were scaled to, with 0 at the top.
pub fn render(points: &[f32], height: f32, columns: usize, rows: usize) -> String {
    let columns = columns.max(1);
    let rows = rows.max(1);
    let mut grid = vec![vec![' '; columns]; rows];

    if !points.is_empty() && height > 0.0 {
        for (col, cell) in column_means(points, columns).into_iter().enumerate() {
            let Some(y) = cell else { continue };
            let row = ((y / height) * rows as f32).clamp(0.0, rows as f32 - 1.0) as usize;
            grid[row][col] = '*';
        }
    }

    let mut out = String::with_capacity(rows * (columns + 1));
    for line in grid {
        out.extend(line);
        out.push('\n');
    }
    out
}

fn column_means(points: &[f32], columns: usize) -> Vec<Option<f32>> {
    let mut sums = vec![(0.0f32, 0usize); columns];
    for (i, &y) in points.iter().enumerate() {
        let col = i * columns / points.len();
        sums[col].0 += y;
        sums[col].1 += 1;
    }
    sums.into_iter()
        .map(|(sum, n)| (n > 0).then(|| sum / n as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_line_sits_in_the_middle() {
        let points = vec![50.0; 64];
        let text = render(&points, 100.0, 8, 5);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "********");
        assert!(lines[0].trim().is_empty());
    }

    #[test]
    fn extremes_are_clamped_to_the_edges() {
        let points = [0.0, 100.0];
        let text = render(&points, 100.0, 2, 4);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "* ");
        assert_eq!(lines[3], " *");
    }

    #[test]
    fn sparse_points_leave_gaps() {
        let text = render(&[50.0], 100.0, 4, 3);
        assert_eq!(text.lines().nth(1), Some("*   "));
    }
}
