//! The 16-color mIRC palette and nearest-color lookup.
//!
//! Embed accent colors arrive as 24-bit RGB values; clients can only
//! display the fixed palette, so the gateway picks the palette entry with
//! the smallest squared RGB distance.

/// The classic mIRC palette as 0xRRGGBB values, indexed by palette index.
pub const PALETTE: [u32; 16] = [
    0xFFFFFF, // 0 white
    0x000000, // 1 black
    0x00007F, // 2 blue
    0x009300, // 3 green
    0xFF0000, // 4 red
    0x7F0000, // 5 brown
    0x9C009C, // 6 purple
    0xFC7F00, // 7 orange
    0xFFFF00, // 8 yellow
    0x00FC00, // 9 light green
    0x009393, // 10 teal
    0x00FFFF, // 11 cyan
    0x0000FC, // 12 light blue
    0xFF00FF, // 13 pink
    0x7F7F7F, // 14 grey
    0xD2D2D2, // 15 light grey
];

fn distance(a: u32, b: u32) -> u32 {
    let (ar, ag, ab) = ((a >> 16 & 0xFF) as i32, (a >> 8 & 0xFF) as i32, (a & 0xFF) as i32);
    let (br, bg, bb) = ((b >> 16 & 0xFF) as i32, (b >> 8 & 0xFF) as i32, (b & 0xFF) as i32);
    let (dr, dg, db) = (ar - br, ag - bg, ab - bb);
    (dr * dr + dg * dg + db * db) as u32
}

/// Find the palette index closest to a 24-bit RGB color.
pub fn nearest(rgb: u32) -> u8 {
    let mut best = 0usize;
    let mut best_distance = u32::MAX;
    for (index, &entry) in PALETTE.iter().enumerate() {
        let d = distance(rgb & 0xFF_FFFF, entry);
        if d < best_distance {
            best = index;
            best_distance = d;
        }
    }
    best as u8
}
