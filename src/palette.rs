use rand::Rng;
use std::fmt;
use std::iter::once;
use thiserror::Error;

/// Color shown for days that have not been marked.  Never assigned to a
/// marked day.
pub(crate) const BLANK_COLOR: &str = "#FAFAFA";

pub(crate) static PALETTE: &[&str] = &[
    BLANK_COLOR,
    "#F93943", // strawberry red
    "#1C7C54", // turf green
    "#B2945B", // camel
    "#197BBD", // teal blue
    "#4A9D8F", // muted teal
    "#E76F73", // dusty coral
    "#5C7FA3", // slate blue
    "#2E2E2E", // charcoal
    "#D4A72C", // mustard gold
    "#C05A3D", // terracotta
    "#D8C8A3", // sand
];

/// The color a marked day was assigned, as stored in the year document
/// (normally `#RRGGBB`)
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct DayColor(String);

impl DayColor {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue channels of a `#RRGGBB` color.  Returns `None` for
    /// anything else, which the document store is free to hand back.
    pub(crate) fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        };
        Some((channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<&str> for DayColor {
    fn from(s: &str) -> DayColor {
        DayColor(s.to_owned())
    }
}

impl From<String> for DayColor {
    fn from(s: String) -> DayColor {
        DayColor(s)
    }
}

impl fmt::Display for DayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of colors for newly marked days
pub(crate) trait ColorPicker {
    fn pick(&self) -> DayColor;
}

impl<T: ColorPicker + ?Sized> ColorPicker for &T {
    fn pick(&self) -> DayColor {
        (**self).pick()
    }
}

/// Picks uniformly at random from a palette with the blank color removed
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct RandomColorPicker {
    // Split so that the palette cannot be empty
    first: DayColor,
    rest: Vec<DayColor>,
}

impl RandomColorPicker {
    pub(crate) fn new(palette: &[&str], blank: &str) -> Result<RandomColorPicker, PaletteError> {
        let mut colors = palette
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(blank))
            .map(|&c| DayColor::from(c));
        let first = colors.next().ok_or(PaletteError)?;
        Ok(RandomColorPicker {
            first,
            rest: colors.collect(),
        })
    }

    pub(crate) fn colors(&self) -> impl Iterator<Item = &DayColor> {
        once(&self.first).chain(&self.rest)
    }
}

impl ColorPicker for RandomColorPicker {
    fn pick(&self) -> DayColor {
        let i = rand::thread_rng().gen_range(0..=self.rest.len());
        i.checked_sub(1)
            .and_then(|j| self.rest.get(j))
            .unwrap_or(&self.first)
            .clone()
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("palette has no colors besides the blank color")]
pub(crate) struct PaletteError;

/// Hands out colors from a fixed list in order, wrapping around
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct SequencePicker {
    colors: Vec<&'static str>,
    next: std::cell::Cell<usize>,
}

#[cfg(test)]
impl SequencePicker {
    pub(crate) fn new(colors: &[&'static str]) -> SequencePicker {
        SequencePicker {
            colors: colors.to_vec(),
            next: std::cell::Cell::new(0),
        }
    }
}

#[cfg(test)]
impl ColorPicker for SequencePicker {
    fn pick(&self) -> DayColor {
        let i = self.next.get();
        self.next.set(i + 1);
        DayColor::from(self.colors[i % self.colors.len()])
    }
}
