//! Text grammar for vector and matrix elements
//!
//! ```text
//! vec4(x, y, z, w)
//! mat4x4((r0c0, r0c1, r0c2, r0c3), (r1c0, ...), (r2c0, ...), (r3c0, ...))
//! ```
//!
//! Each matrix group is one row. Components print with six decimals.

use glam::{Mat4, Vec4};

fn components<const N: usize>(body: &str) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    let mut parts = body.split(',');
    for slot in out.iter_mut() {
        *slot = parts.next()?.trim().parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

fn call<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    text.trim()
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

pub fn parse_vec4(text: &str) -> Option<Vec4> {
    let [x, y, z, w] = components::<4>(call(text, "vec4")?)?;
    Some(Vec4::new(x, y, z, w))
}

pub fn parse_mat4(text: &str) -> Option<Mat4> {
    let mut rest = call(text, "mat4x4")?.trim();
    let mut rows = [[0.0f32; 4]; 4];

    for (i, row) in rows.iter_mut().enumerate() {
        rest = rest.strip_prefix('(')?;
        let end = rest.find(')')?;
        *row = components::<4>(&rest[..end])?;
        rest = rest[end + 1..].trim_start();
        if i < 3 {
            rest = rest.strip_prefix(',')?.trim_start();
        }
    }

    if !rest.is_empty() {
        return None;
    }
    // glam is column-major; the text is row-major
    Some(Mat4::from_cols_array_2d(&rows).transpose())
}

pub fn format_vec4(v: Vec4) -> String {
    format!("vec4({:.6}, {:.6}, {:.6}, {:.6})", v.x, v.y, v.z, v.w)
}

pub fn format_mat4(m: Mat4) -> String {
    let rows: Vec<String> = (0..4)
        .map(|i| {
            let r = m.row(i);
            format!("({:.6}, {:.6}, {:.6}, {:.6})", r.x, r.y, r.z, r.w)
        })
        .collect();
    format!("mat4x4({})", rows.join(", "))
}
