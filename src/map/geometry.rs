use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_dot_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a segment between dot positions, skipping segments that cannot touch
/// the canvas or that span more than a screen (projection wrap-arounds).
pub fn draw_segment(canvas: &mut BrailleCanvas, p0: (i32, i32), p1: (i32, i32)) {
    let (w, h) = canvas.dot_size();
    let (w, h) = (w as i32, h as i32);

    let min_x = p0.0.min(p1.0);
    let max_x = p0.0.max(p1.0);
    let min_y = p0.1.min(p1.1);
    let max_y = p0.1.max(p1.1);
    if max_x < 0 || min_x >= w || max_y < 0 || min_y >= h {
        return;
    }
    if max_x - min_x > w || max_y - min_y > h {
        return;
    }

    draw_line(canvas, p0.0, p0.1, p1.0, p1.1);
}
