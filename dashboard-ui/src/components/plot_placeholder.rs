//! Plot Placeholder
//!
//! A fixed example line chart drawn on mount and redrawn only when the
//! window is resized. It does not follow the live sample.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Example series as (x, y) points
pub const EXAMPLE_SERIES: [(f64, f64); 3] = [(1.0, 2.0), (2.0, 6.0), (3.0, 3.0)];

/// Plot height in pixels
pub const PLOT_HEIGHT: u32 = 200;

/// Paper and plot background
pub const BACKGROUND: &str = "#181818";

pub const FONT_COLOR: &str = "#fff";

const LINE_COLOR: &str = "#1f77b4";
const GRID_COLOR: &str = "#2e2e2e";

/// Backing width used until the canvas has been laid out
const FALLBACK_WIDTH: u32 = 600;

/// Plot area margins in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

pub const MARGINS: Margins = Margins {
    top: 20.0,
    left: 40.0,
    right: 20.0,
    bottom: 40.0,
};

/// Container style: full width, fixed height, thin white rounded border
pub fn container_style() -> String {
    format!(
        "width: 100%; height: {}px; border: 1px solid #ffffff; border-radius: 8px; overflow: hidden;",
        PLOT_HEIGHT
    )
}

/// Maps data coordinates onto the canvas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: f64,
    height: f64,
}

impl Projection {
    /// Fit a series into a `width` x `height` canvas inside [`MARGINS`]
    ///
    /// Both axes get 10% padding so markers are not clipped.
    pub fn fit(series: &[(f64, f64)], width: f64, height: f64) -> Self {
        let (mut x_min, mut x_max) = bounds(series.iter().map(|p| p.0));
        let (mut y_min, mut y_max) = bounds(series.iter().map(|p| p.1));

        let x_pad = if x_max > x_min { (x_max - x_min) * 0.1 } else { 1.0 };
        let y_pad = if y_max > y_min { (y_max - y_min) * 0.1 } else { 1.0 };
        x_min -= x_pad;
        x_max += x_pad;
        y_min -= y_pad;
        y_max += y_pad;

        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            width,
            height,
        }
    }

    /// Canvas position of a data point
    pub fn point(&self, x: f64, y: f64) -> (f64, f64) {
        let plot_width = self.width - MARGINS.left - MARGINS.right;
        let plot_height = self.height - MARGINS.top - MARGINS.bottom;

        let px = MARGINS.left + (x - self.x_min) / (self.x_max - self.x_min) * plot_width;
        // Canvas y grows downward
        let py = MARGINS.top + (self.y_max - y) / (self.y_max - self.y_min) * plot_height;
        (px, py)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        (min, max)
    } else {
        (0.0, 1.0)
    }
}

/// Static example chart
#[component]
pub fn PlotPlaceholder() -> impl IntoView {
    let canvas_ref = create_node_ref::<html::Canvas>();

    // Draw on the first run that has a canvas; the effect never redraws
    create_effect(move |drawn: Option<bool>| {
        if drawn == Some(true) {
            return true;
        }
        match canvas_ref.get() {
            Some(canvas) => {
                draw_plot(&canvas);
                true
            }
            None => false,
        }
    });

    // Same fixed series, redrawn at the new width
    let resize = window_event_listener(ev::resize, move |_| {
        if let Some(canvas) = canvas_ref.get_untracked() {
            draw_plot(&canvas);
        }
    });
    on_cleanup(move || resize.remove());

    view! {
        <div style=container_style()>
            <canvas
                node_ref=canvas_ref
                height=PLOT_HEIGHT
                style=format!("display: block; width: 100%; height: {}px;", PLOT_HEIGHT)
            />
        </div>
    }
}

/// Draw the example series on canvas
fn draw_plot(canvas: &HtmlCanvasElement) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    // Responsive: match the backing store to the laid-out width
    let width = match canvas.client_width() {
        w if w > 0 => w as u32,
        _ => FALLBACK_WIDTH,
    };
    canvas.set_width(width);
    canvas.set_height(PLOT_HEIGHT);

    let width = width as f64;
    let height = PLOT_HEIGHT as f64;
    let projection = Projection::fit(&EXAMPLE_SERIES, width, height);

    ctx.set_fill_style(&BACKGROUND.into());
    ctx.fill_rect(0.0, 0.0, width, height);

    // Grid and tick labels at each whole unit
    ctx.set_stroke_style(&GRID_COLOR.into());
    ctx.set_line_width(1.0);
    ctx.set_fill_style(&FONT_COLOR.into());
    ctx.set_font("12px sans-serif");

    for y in (0..=7).map(f64::from) {
        let (_, py) = projection.point(0.0, y);
        if py < MARGINS.top || py > height - MARGINS.bottom {
            continue;
        }
        ctx.begin_path();
        ctx.move_to(MARGINS.left, py);
        ctx.line_to(width - MARGINS.right, py);
        ctx.stroke();
        let _ = ctx.fill_text(&format!("{}", y), 10.0, py + 4.0);
    }

    for &(x, _) in EXAMPLE_SERIES.iter() {
        let (px, _) = projection.point(x, 0.0);
        let _ = ctx.fill_text(&format!("{}", x), px - 3.0, height - MARGINS.bottom + 18.0);
    }

    // Series line
    ctx.set_stroke_style(&LINE_COLOR.into());
    ctx.set_line_width(2.0);
    ctx.begin_path();
    for (i, &(x, y)) in EXAMPLE_SERIES.iter().enumerate() {
        let (px, py) = projection.point(x, y);
        if i == 0 {
            ctx.move_to(px, py);
        } else {
            ctx.line_to(px, py);
        }
    }
    ctx.stroke();

    // Markers
    ctx.set_fill_style(&LINE_COLOR.into());
    for &(x, y) in EXAMPLE_SERIES.iter() {
        let (px, py) = projection.point(x, y);
        ctx.begin_path();
        let _ = ctx.arc(px, py, 4.0, 0.0, std::f64::consts::PI * 2.0);
        ctx.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_series_and_styling() {
        assert_eq!(EXAMPLE_SERIES, [(1.0, 2.0), (2.0, 6.0), (3.0, 3.0)]);
        assert_eq!(PLOT_HEIGHT, 200);
        assert_eq!(
            MARGINS,
            Margins {
                top: 20.0,
                left: 40.0,
                right: 20.0,
                bottom: 40.0,
            }
        );
        assert_eq!(BACKGROUND, "#181818");

        let style = container_style();
        assert!(style.contains("height: 200px"));
        assert!(style.contains("width: 100%"));
        assert!(style.contains("border-radius: 8px"));
    }

    #[test]
    fn test_projection_stays_inside_margins() {
        let projection = Projection::fit(&EXAMPLE_SERIES, 400.0, 200.0);

        for &(x, y) in EXAMPLE_SERIES.iter() {
            let (px, py) = projection.point(x, y);
            assert!(px > MARGINS.left && px < 400.0 - MARGINS.right);
            assert!(py > MARGINS.top && py < 200.0 - MARGINS.bottom);
        }

        // Highest point is drawn nearest the top
        let (_, peak) = projection.point(2.0, 6.0);
        let (_, low) = projection.point(1.0, 2.0);
        assert!(peak < low);
    }

    #[test]
    fn test_projection_of_flat_series() {
        let projection = Projection::fit(&[(1.0, 5.0)], 100.0, 100.0);
        let (px, py) = projection.point(1.0, 5.0);
        assert!(px.is_finite() && py.is_finite());
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn container(width: u32) -> web_sys::HtmlElement {
        let el = document().create_element("div").unwrap();
        el.set_attribute("style", &format!("width: {}px;", width)).unwrap();
        document().body().unwrap().append_child(&el).unwrap();
        el.unchecked_into()
    }

    async fn settle() {
        for _ in 0..2 {
            let tick = js_sys::Promise::resolve(&wasm_bindgen::JsValue::NULL);
            wasm_bindgen_futures::JsFuture::from(tick).await.unwrap();
        }
    }

    fn only_canvas(container: &web_sys::HtmlElement) -> HtmlCanvasElement {
        let canvases = container.get_elements_by_tag_name("canvas");
        assert_eq!(canvases.length(), 1);
        canvases.item(0).unwrap().unchecked_into()
    }

    #[wasm_bindgen_test]
    async fn test_mount_renders_one_canvas_at_fixed_height() {
        let container = container(400);
        mount_to(container.clone(), || view! { <PlotPlaceholder /> });
        settle().await;

        let canvas = only_canvas(&container);
        assert_eq!(canvas.height(), PLOT_HEIGHT);
        assert!(canvas.get_attribute("style").unwrap().contains("height: 200px"));
        assert!(container.inner_html().contains("border-radius: 8px"));
    }

    #[wasm_bindgen_test]
    async fn test_resize_redraws_at_new_width() {
        let container = container(400);
        mount_to(container.clone(), || view! { <PlotPlaceholder /> });
        settle().await;

        let canvas = only_canvas(&container);
        let before = canvas.width();
        assert_eq!(before, canvas.client_width() as u32);

        container.set_attribute("style", "width: 250px;").unwrap();
        window()
            .dispatch_event(&web_sys::Event::new("resize").unwrap())
            .unwrap();

        assert_eq!(canvas.width(), canvas.client_width() as u32);
        assert!(canvas.width() < before);
        assert_eq!(canvas.height(), PLOT_HEIGHT);
    }
}
