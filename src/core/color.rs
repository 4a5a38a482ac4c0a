//! Deterministic fill color for a country name.
//!
//! BKDR hash of the name picks a hue, then a saturation and lightness from
//! small fixed tables, so neighbouring countries rarely share a shade.

const SEED: u64 = 131;
const SEED2: u64 = 137;
const MAX_SAFE: u64 = 9_007_199_254_740_991 / SEED2;

const SATURATIONS: [f64; 3] = [0.35, 0.5, 0.65];
const LIGHTNESSES: [f64; 3] = [0.35, 0.5, 0.65];

fn bkdr_hash(name: &str) -> u64 {
    // Trailing 'x' keeps one-letter names from clustering at low hues.
    name.encode_utf16()
        .chain("x".encode_utf16())
        .fold(0u64, |mut hash, unit| {
            if hash > MAX_SAFE {
                hash /= SEED2;
            }
            hash.wrapping_mul(SEED).wrapping_add(unit as u64)
        })
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [u8; 3] {
    let h = hue / 360.0;
    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;

    [h + 1.0 / 3.0, h, h - 1.0 / 3.0].map(|mut t| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let channel = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * 6.0 * (2.0 / 3.0 - t)
        } else {
            p
        };
        (channel * 255.0).round() as u8
    })
}

/// `#rrggbb` for `name`; identical input always yields identical output.
pub fn color_for_name(name: &str) -> String {
    let mut hash = bkdr_hash(name);

    let hue = (hash % 359) as f64;
    hash /= 360;
    let saturation = SATURATIONS[(hash % SATURATIONS.len() as u64) as usize];
    hash /= SATURATIONS.len() as u64;
    let lightness = LIGHTNESSES[(hash % LIGHTNESSES.len() as u64) as usize];

    let [r, g, b] = hsl_to_rgb(hue, saturation, lightness);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}
