//! Categorical palettes
//!
//! `CATEGORY10` and `CATEGORY20C` carry the usual d3 categorical colors
//! (also known as tab10 / tab20c). Lookups wrap around so any number of
//! modes or levels gets a color.

use plotters::style::RGBColor;

pub const CATEGORY10: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

pub const CATEGORY20C: [RGBColor; 20] = [
    RGBColor(0x31, 0x82, 0xbd),
    RGBColor(0x6b, 0xae, 0xd6),
    RGBColor(0x9e, 0xca, 0xe1),
    RGBColor(0xc6, 0xdb, 0xef),
    RGBColor(0xe6, 0x55, 0x0d),
    RGBColor(0xfd, 0x8d, 0x3c),
    RGBColor(0xfd, 0xae, 0x6b),
    RGBColor(0xfd, 0xd0, 0xa2),
    RGBColor(0x31, 0xa3, 0x54),
    RGBColor(0x74, 0xc4, 0x76),
    RGBColor(0xa1, 0xd9, 0x9b),
    RGBColor(0xc7, 0xe9, 0xc0),
    RGBColor(0x75, 0x6b, 0xb1),
    RGBColor(0x9e, 0x9a, 0xc8),
    RGBColor(0xbc, 0xbd, 0xdc),
    RGBColor(0xda, 0xda, 0xeb),
    RGBColor(0x63, 0x63, 0x63),
    RGBColor(0x96, 0x96, 0x96),
    RGBColor(0xbd, 0xbd, 0xbd),
    RGBColor(0xd9, 0xd9, 0xd9),
];

pub const MEAN_BLACK: RGBColor = RGBColor(0, 0, 0);
pub const HARMONIC_GREY: RGBColor = RGBColor(0x55, 0x55, 0x55);

pub fn category10(index: usize) -> RGBColor {
    CATEGORY10[index % CATEGORY10.len()]
}

pub fn category20c(index: usize) -> RGBColor {
    CATEGORY20C[index % CATEGORY20C.len()]
}
