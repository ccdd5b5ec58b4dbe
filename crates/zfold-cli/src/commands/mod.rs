pub mod config;
pub mod frap;
pub mod info;
pub mod project;

use zfold_core::io::ser::StackLayout;

/// Parse a `ZxCxT` layout such as `12x2x40`. Missing trailing axes default to 1.
pub fn parse_layout(s: &str) -> Result<StackLayout, String> {
    let sizes: Vec<usize> = s
        .split('x')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid axis size '{part}'"))
        })
        .collect::<Result<_, _>>()?;
    if sizes.is_empty() || sizes.len() > 3 || sizes.contains(&0) {
        return Err(format!("expected ZxCxT with positive sizes, got '{s}'"));
    }
    Ok(StackLayout {
        size_z: sizes[0],
        size_c: sizes.get(1).copied().unwrap_or(1),
        size_t: sizes.get(2).copied().unwrap_or(1),
    })
}
