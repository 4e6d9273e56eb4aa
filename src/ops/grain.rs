// ============================================================================
// GRAIN NOISE — integer-hashed value noise and fractal sums
// ============================================================================
//
// Everything here is pure integer/float math so the WGSL fragment shader can
// mirror it line for line (see `gpu::shaders::FILM_FRAGMENT_SHADER`).

/// Simple hash for deterministic noise.
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Lattice value in [0, 1).
#[inline]
pub fn lattice(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(
        x.wrapping_mul(374761393)
            .wrapping_add(y.wrapping_mul(668265263))
            .wrapping_add(seed.wrapping_mul(2246822519)),
    );
    (h & 0x00FFFFFF) as f32 / 16777216.0
}

/// Smooth value noise in [0, 1): hermite-interpolated lattice corners.
pub fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let ix = x.floor();
    let iy = y.floor();
    let fx = x - ix;
    let fy = y - iy;
    // Negative cells wrap through i32 so both halves of the plane hash apart.
    let xi = ix as i32 as u32;
    let yi = iy as i32 as u32;

    let a = lattice(xi, yi, seed);
    let b = lattice(xi.wrapping_add(1), yi, seed);
    let c = lattice(xi, yi.wrapping_add(1), seed);
    let d = lattice(xi.wrapping_add(1), yi.wrapping_add(1), seed);

    let ux = fx * fx * (3.0 - 2.0 * fx);
    let uy = fy * fy * (3.0 - 2.0 * fy);

    a + (b - a) * ux + (c - a) * uy * (1.0 - ux) + (d - b) * ux * uy
}

/// Fractal sum of `octaves` layers, normalized back to [0, 1).
pub fn fbm(x: f32, y: f32, octaves: u32, seed: u32) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    let mut total = 0.0;
    for octave in 0..octaves.max(1) {
        value += amplitude * value_noise(x * frequency, y * frequency, seed.wrapping_add(octave));
        total += amplitude;
        frequency *= 2.0;
        amplitude *= 0.5;
    }
    value / total
}

/// Zero-centred grain sample in [-1, 1).
#[inline]
pub fn grain_sample(x: f32, y: f32, octaves: u32, seed: u32) -> f32 {
    fbm(x, y, octaves, seed) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic_and_bounded() {
        for i in 0..200 {
            let x = i as f32 * 0.37 - 20.0;
            let y = i as f32 * 0.91 - 45.0;
            let a = fbm(x, y, 4, 3);
            assert_eq!(a, fbm(x, y, 4, 3));
            assert!((0.0..1.0).contains(&a), "fbm out of range: {a}");
        }
    }

    #[test]
    fn value_noise_hits_lattice_at_integer_points() {
        assert_eq!(value_noise(5.0, 9.0, 1), lattice(5, 9, 1));
    }

    #[test]
    fn seeds_decorrelate() {
        let same = (0..64)
            .filter(|i| {
                let x = *i as f32 * 1.3;
                (value_noise(x, 2.5, 0) - value_noise(x, 2.5, 1)).abs() < 1e-6
            })
            .count();
        assert!(same < 4);
    }

    #[test]
    fn grain_is_roughly_zero_mean() {
        let mut sum = 0.0;
        let n = 64 * 64;
        for y in 0..64 {
            for x in 0..64 {
                sum += grain_sample(x as f32 * 0.5, y as f32 * 0.5, 4, 0);
            }
        }
        assert!((sum / n as f32).abs() < 0.1);
    }
}
