/// Star rating display
/// Draws five stars for an average rating, with half stars
use std::f32::consts::{FRAC_PI_2, PI};

use iced::widget::canvas::{self, Path};
use iced::{Color, Element, Length, Point, Rectangle};

use super::theme;
use crate::Message;

const STARS: u8 = 5;
const GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    /// Completely filled stars
    pub full: u8,
    /// Whether the star after the full ones is half filled
    pub half: bool,
}

impl StarRating {
    /// Stars for an average rating.
    ///
    /// The fractional part rounds to the nearest half: below 0.25 adds
    /// nothing, 0.25 up to 0.75 adds a half star, 0.75 and above adds a
    /// full star.
    pub fn from_rating(rating: f64) -> Self {
        let rating = if rating.is_finite() {
            rating.clamp(0.0, f64::from(STARS))
        } else {
            0.0
        };
        let whole = rating.floor();
        let frac = rating - whole;

        let mut full = whole as u8;
        let mut half = false;
        if frac >= 0.75 {
            full += 1;
        } else if frac >= 0.25 {
            half = true;
        }

        Self {
            full: full.min(STARS),
            half: half && full < STARS,
        }
    }

    /// Stars for a single vote
    pub fn whole(stars: u8) -> Self {
        Self {
            full: stars.min(STARS),
            half: false,
        }
    }

    pub fn view<'a>(self, size: f32) -> Element<'a, Message> {
        let width = size * f32::from(STARS) + GAP * f32::from(STARS - 1);
        canvas::Canvas::new(Stars { rating: self })
            .width(Length::Fixed(width))
            .height(Length::Fixed(size))
            .into()
    }
}

/// Canvas program for a `StarRating`
#[derive(Debug, Clone, Copy)]
struct Stars {
    rating: StarRating,
}

impl canvas::Program<Message> for Stars {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &iced::Theme,
        bounds: Rectangle,
        _cursor: iced::mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let size = bounds.height;
        let outer = size / 2.0;
        let inner = outer * 0.4;
        let empty = Color {
            a: 0.25,
            ..theme::WHITE
        };

        for i in 0..STARS {
            let center = Point::new(outer + f32::from(i) * (size + GAP), outer);
            let points = star_points(center, outer, inner);

            frame.fill(&polygon(&points), empty);

            if i < self.rating.full {
                frame.fill(&polygon(&points), theme::PINK);
            } else if i == self.rating.full && self.rating.half {
                // Left half: bottom center point round to the top point
                let mut left: Vec<Point> = points[5..].to_vec();
                left.push(points[0]);
                frame.fill(&polygon(&left), theme::PINK);
            }
        }

        vec![frame.into_geometry()]
    }
}

/// Alternating outer/inner vertices, starting at the top and going clockwise
fn star_points(center: Point, outer: f32, inner: f32) -> [Point; 10] {
    std::array::from_fn(|i| {
        let angle = -FRAC_PI_2 + i as f32 * PI / 5.0;
        let radius = if i % 2 == 0 { outer } else { inner };
        Point::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        )
    })
}

fn polygon(points: &[Point]) -> Path {
    let mut builder = canvas::path::Builder::new();
    if let Some((first, rest)) = points.split_first() {
        builder.move_to(*first);
        for point in rest {
            builder.line_to(*point);
        }
        builder.close();
    }
    builder.build()
}
