// ============================================================================
// FILM COLOR MODEL — per-pixel emulation transform, CPU reference
// ============================================================================
//
// `shade` is the whole look for one output pixel.  Stage order is fixed:
//
//    1. decode (optional linear light)
//    2. halation      — ring kernel over the ORIGINAL image, red-tinted
//    3. black & white — collapse to film luma, skipping 4
//    4. curves → warmth → saturation
//    5. contrast S-curve
//    6. tone split (highlights / shadows)
//    7. bloom         — ring kernel over the ORIGINAL image, colour-preserving
//    8. grain         — luminance-masked fBm, per-channel unless monochrome
//    9. fade
//   10. vignette
//   11. encode (if 1 decoded)
//   12. clamp
//
// The WGSL fragment shader in `gpu::shaders` is a transliteration of this file;
// keep the two in step.
// ============================================================================

use std::f32::consts::TAU;

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::grain;
use crate::params::{CurveTriple, FilmParameters, clamp_finite};

/// Film-response luma weights used by the monochrome branch and desaturation.
pub const FILM_LUMA: [f32; 3] = [0.3, 0.59, 0.11];
/// Rec.601 luma used for tone masks and grain masking.
pub const REC601_LUMA: [f32; 3] = [0.299, 0.587, 0.114];

// ============================================================================
// TUNABLE CONSTANTS
// ============================================================================

/// Constants of the color model.  `Default` holds the canonical values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilmTuning {
    /// Run the pipeline on linearized values (sRGB decode/encode around it).
    pub linear_light: bool,

    pub halation_threshold: f32,
    pub halation_samples: u32,
    /// Inner ring radius in UV units at `halation = 1`.
    pub halation_radius: f32,
    pub halation_gain: f32,
    pub halation_tint: [f32; 3],

    pub bloom_threshold: f32,
    pub bloom_samples: u32,
    pub bloom_radius: f32,
    pub bloom_gain: f32,

    pub grain_octaves: u32,
    pub grain_amplitude: f32,
    pub grain_mask_exponent: f32,
    pub grain_mask_gain: f32,
    /// 0 = one shared field for R/G/B, 1 = independent fields.
    pub grain_chroma: f32,
    /// Grain cells travelled per second of render time.
    pub grain_drift: f32,

    pub warmth_red: f32,
    pub warmth_blue: f32,

    pub fade_lift: f32,

    pub vignette_strength: f32,
    /// Normalized centre distance where darkening starts.
    pub vignette_inner: f32,
}

impl Default for FilmTuning {
    fn default() -> Self {
        Self {
            linear_light: false,
            halation_threshold: 0.8,
            halation_samples: 16,
            halation_radius: 0.01,
            halation_gain: 1.0,
            halation_tint: [1.5, 0.8, 0.6],
            bloom_threshold: 0.7,
            bloom_samples: 12,
            bloom_radius: 0.015,
            bloom_gain: 0.5,
            grain_octaves: 4,
            grain_amplitude: 0.1,
            grain_mask_exponent: 0.7,
            grain_mask_gain: 1.5,
            grain_chroma: 0.35,
            grain_drift: 1.0,
            warmth_red: 0.1,
            warmth_blue: 0.08,
            fade_lift: 0.25,
            vignette_strength: 0.8,
            vignette_inner: 0.25,
        }
    }
}

/// Ring taps per glow are capped here; each tap is two texture reads.
pub const MAX_GLOW_SAMPLES: u32 = 64;
pub const MAX_GRAIN_OCTAVES: u32 = 8;

impl FilmTuning {
    /// Counts clamped to something a frame can afford, non-finite values
    /// replaced by the defaults, and `vignette_inner` kept below 1.
    pub fn sanitized(&self) -> Self {
        let d = FilmTuning::default();
        Self {
            linear_light: self.linear_light,
            halation_threshold: clamp_finite(self.halation_threshold, 0.0, 0.99, d.halation_threshold),
            halation_samples: self.halation_samples.clamp(1, MAX_GLOW_SAMPLES),
            halation_radius: clamp_finite(self.halation_radius, 0.0, 0.5, d.halation_radius),
            halation_gain: clamp_finite(self.halation_gain, 0.0, 16.0, d.halation_gain),
            halation_tint: [0, 1, 2].map(|i| clamp_finite(self.halation_tint[i], 0.0, 16.0, d.halation_tint[i])),
            bloom_threshold: clamp_finite(self.bloom_threshold, 0.0, 0.99, d.bloom_threshold),
            bloom_samples: self.bloom_samples.clamp(1, MAX_GLOW_SAMPLES),
            bloom_radius: clamp_finite(self.bloom_radius, 0.0, 0.5, d.bloom_radius),
            bloom_gain: clamp_finite(self.bloom_gain, 0.0, 16.0, d.bloom_gain),
            grain_octaves: self.grain_octaves.clamp(1, MAX_GRAIN_OCTAVES),
            grain_amplitude: clamp_finite(self.grain_amplitude, 0.0, 1.0, d.grain_amplitude),
            grain_mask_exponent: clamp_finite(self.grain_mask_exponent, 0.01, 16.0, d.grain_mask_exponent),
            grain_mask_gain: clamp_finite(self.grain_mask_gain, 0.0, 16.0, d.grain_mask_gain),
            grain_chroma: clamp_finite(self.grain_chroma, 0.0, 1.0, d.grain_chroma),
            grain_drift: clamp_finite(self.grain_drift, -1000.0, 1000.0, d.grain_drift),
            warmth_red: clamp_finite(self.warmth_red, 0.0, 1.0, d.warmth_red),
            warmth_blue: clamp_finite(self.warmth_blue, 0.0, 1.0, d.warmth_blue),
            fade_lift: clamp_finite(self.fade_lift, 0.0, 1.0, d.fade_lift),
            vignette_strength: clamp_finite(self.vignette_strength, 0.0, 1.0, d.vignette_strength),
            vignette_inner: clamp_finite(self.vignette_inner, 0.0, 0.99, d.vignette_inner),
        }
    }
}

/// Everything one frame needs besides the source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Already sanitized; see [`FrameInputs::new`].
    pub params: FilmParameters,
    /// Already sanitized, like `params`.
    pub tuning: FilmTuning,
    pub resolution: [f32; 2],
    /// Seconds since the renderer started; drives grain drift.
    pub time: f32,
}

impl FrameInputs {
    pub fn new(params: &FilmParameters, tuning: &FilmTuning, width: u32, height: u32, time: f32) -> Self {
        Self {
            params: params.sanitized(),
            tuning: tuning.sanitized(),
            resolution: [width as f32, height as f32],
            time,
        }
    }
}

// ============================================================================
// SAMPLING
// ============================================================================

/// Filtered texture lookup in normalized coordinates, values in [0, 1].
pub trait Sampler: Sync {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4];
}

/// Bilinear, clamp-to-edge lookup into an 8-bit image.  Texel centres sit at
/// `(i + 0.5) / size`, the same convention as a GPU linear sampler.
pub struct BilinearSampler<'a> {
    img: &'a RgbaImage,
}

impl<'a> BilinearSampler<'a> {
    pub fn new(img: &'a RgbaImage) -> Self {
        Self { img }
    }

    #[inline]
    fn texel(&self, x: i32, y: i32) -> [f32; 4] {
        let cx = x.clamp(0, self.img.width() as i32 - 1) as u32;
        let cy = y.clamp(0, self.img.height() as i32 - 1) as u32;
        let p = self.img.get_pixel(cx, cy);
        [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
    }
}

impl Sampler for BilinearSampler<'_> {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let fx = uv[0] * self.img.width() as f32 - 0.5;
        let fy = uv[1] * self.img.height() as f32 - 0.5;
        let x0 = fx.floor() as i32;
        let y0 = fy.floor() as i32;
        let dx = fx - x0 as f32;
        let dy = fy - y0 as f32;

        let p00 = self.texel(x0, y0);
        let p10 = self.texel(x0 + 1, y0);
        let p01 = self.texel(x0, y0 + 1);
        let p11 = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0f32; 4];
        for c in 0..4 {
            out[c] = (p00[c] * (1.0 - dx) * (1.0 - dy)
                + p10[c] * dx * (1.0 - dy)
                + p01[c] * (1.0 - dx) * dy
                + p11[c] * dx * dy)
                / 255.0;
        }
        out
    }
}

// ============================================================================
// COMPONENT FUNCTIONS
// ============================================================================

#[inline]
pub fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    let c = c.max(0.0);
    if c <= 0.0031308 { c * 12.92 } else { 1.055 * c.powf(1.0 / 2.4) - 0.055 }
}

/// Toe/mid/shoulder response: `pow(x, 1/toe) * mid + (1 - mid) * shoulder`.
pub fn apply_curve(x: f32, curve: CurveTriple) -> f32 {
    if curve.is_neutral() {
        return x;
    }
    x.max(0.0).powf(1.0 / curve.toe) * curve.mid + (1.0 - curve.mid) * curve.shoulder
}

/// Contrast S-curve; `strength = 1` is the identity.
pub fn scurve(x: f32, strength: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    let s = strength - 1.0;
    (x - 0.5) * (1.0 + s) / (1.0 + s * (x - 0.5).abs() * 2.0) + 0.5
}

/// Additive red boost and blue cut; `signed_warmth = 0` is the identity.
pub fn apply_warmth(c: [f32; 3], signed_warmth: f32, tuning: &FilmTuning) -> [f32; 3] {
    [
        c[0] + signed_warmth * tuning.warmth_red,
        c[1],
        c[2] - signed_warmth * tuning.warmth_blue,
    ]
}

pub fn rgb_to_hsv(c: [f32; 3]) -> [f32; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    let delta = max - min;
    let h = if delta <= 0.0 {
        0.0
    } else if max == c[0] {
        ((c[1] - c[2]) / delta).rem_euclid(6.0) / 6.0
    } else if max == c[1] {
        ((c[2] - c[0]) / delta + 2.0) / 6.0
    } else {
        ((c[0] - c[1]) / delta + 4.0) / 6.0
    };
    let s = if max > 0.0 { delta / max } else { 0.0 };
    [h, s, max]
}

pub fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    let [h, s, v] = hsv;
    let k = |n: f32| {
        let k = (n + h * 6.0).rem_euclid(6.0);
        v - v * s * k.min(4.0 - k).clamp(0.0, 1.0)
    };
    [k(5.0), k(3.0), k(1.0)]
}

/// `s < 1` mixes toward film luma (exactly gray at 0); `s > 1` scales HSV
/// saturation.  Both sides meet at `s = 1`, the identity.
pub fn apply_saturation(c: [f32; 3], s: f32) -> [f32; 3] {
    if s == 1.0 {
        return c;
    }
    if s < 1.0 {
        let l = dot3(c, FILM_LUMA);
        let s = s.max(0.0);
        return [mix(l, c[0], s), mix(l, c[1], s), mix(l, c[2], s)];
    }
    let mut hsv = rgb_to_hsv(c);
    hsv[1] = (hsv[1] * s).min(1.0);
    hsv_to_rgb(hsv)
}

/// Scale highlights above mid-gray and shadows below it, with smooth masks.
pub fn apply_tone_split(c: [f32; 3], highlights: f32, shadows: f32) -> [f32; 3] {
    let l = dot3(c, REC601_LUMA);
    let hm = smoothstep(0.5, 1.0, l);
    let sm = 1.0 - smoothstep(0.0, 0.5, l);
    c.map(|x| {
        let x = mix(x, x * highlights, hm);
        mix(x, x * shadows, sm)
    })
}

pub fn apply_fade(c: [f32; 3], fade: f32, tuning: &FilmTuning) -> [f32; 3] {
    let lift = fade * tuning.fade_lift;
    c.map(|x| x * (1.0 - lift) + lift)
}

/// Darkening factor in (0, 1] at `uv`; 1 everywhere when `vignette = 0`.
pub fn vignette_factor(uv: [f32; 2], vignette: f32, tuning: &FilmTuning) -> f32 {
    let dx = (uv[0] - 0.5) * 2.0;
    let dy = (uv[1] - 0.5) * 2.0;
    let d = (dx * dx + dy * dy).sqrt() / std::f32::consts::SQRT_2;
    1.0 - vignette * tuning.vignette_strength * smoothstep(tuning.vignette_inner, 1.0, d)
}

/// Midtone-peaked grain mask.
pub fn grain_mask(luma: f32, tuning: &FilmTuning) -> f32 {
    let m = (1.0 - (luma.clamp(0.0, 1.0) * 2.0 - 1.0).abs()).max(0.0);
    m.powf(tuning.grain_mask_exponent) * tuning.grain_mask_gain
}

// ============================================================================
// NEIGHBOURHOOD GLOWS
// ============================================================================

#[inline]
fn decode(c: [f32; 4], linear: bool) -> [f32; 3] {
    let rgb = [c[0], c[1], c[2]];
    if linear { rgb.map(srgb_to_linear) } else { rgb }
}

/// Two concentric rings of taps around `uv`; the outer ring sits at twice the
/// radius with half the weight.  `weight` maps a tap colour to its contribution.
fn ring_glow<S, F>(src: &S, uv: [f32; 2], radius: f32, samples: u32, linear: bool, weight: F) -> [f32; 3]
where
    S: Sampler + ?Sized,
    F: Fn([f32; 3]) -> f32,
{
    if samples == 0 || radius <= 0.0 {
        return [0.0; 3];
    }
    let mut acc = [0.0f32; 3];
    for i in 0..samples {
        let angle = i as f32 / samples as f32 * TAU;
        let (sin, cos) = angle.sin_cos();
        for (ring, ring_weight) in [(1.0f32, 1.0f32), (2.0, 0.5)] {
            let r = radius * ring;
            let tap = decode(src.sample([uv[0] + cos * r, uv[1] + sin * r]), linear);
            let k = weight(tap) * ring_weight;
            for c in 0..3 {
                acc[c] += tap[c] * k;
            }
        }
    }
    let norm = samples as f32 * 1.5;
    acc.map(|x| x / norm)
}

#[inline]
fn excess(v: f32, threshold: f32) -> f32 {
    ((v - threshold) / (1.0 - threshold).max(1e-4)).max(0.0)
}

/// Red-dominant glow from over-exposed neighbours, already scaled.
pub fn halation_glow<S: Sampler + ?Sized>(src: &S, uv: [f32; 2], frame: &FrameInputs) -> [f32; 3] {
    let p = &frame.params;
    let t = &frame.tuning;
    if p.halation <= 0.0 {
        return [0.0; 3];
    }
    let glow = ring_glow(src, uv, t.halation_radius * p.halation, t.halation_samples, t.linear_light, |s| {
        excess(s[0].max(s[1]).max(s[2]), t.halation_threshold)
    });
    let k = p.halation * t.halation_gain;
    [glow[0] * t.halation_tint[0] * k, glow[1] * t.halation_tint[1] * k, glow[2] * t.halation_tint[2] * k]
}

/// Colour-preserving glow from bright neighbours, already scaled.
pub fn bloom_glow<S: Sampler + ?Sized>(src: &S, uv: [f32; 2], frame: &FrameInputs) -> [f32; 3] {
    let p = &frame.params;
    let t = &frame.tuning;
    if p.bloom <= 0.0 {
        return [0.0; 3];
    }
    let glow = ring_glow(src, uv, t.bloom_radius, t.bloom_samples, t.linear_light, |s| {
        excess(dot3(s, REC601_LUMA), t.bloom_threshold)
    });
    let k = p.bloom * t.bloom_gain;
    glow.map(|x| x * k)
}

// ============================================================================
// PIPELINE
// ============================================================================

/// The full look for one output pixel.  Alpha passes through untouched.
pub fn shade<S: Sampler + ?Sized>(src: &S, uv: [f32; 2], frame: &FrameInputs) -> [f32; 4] {
    let p = &frame.params;
    let t = &frame.tuning;
    let monochrome = p.is_monochrome();

    let texel = src.sample(uv);
    let mut c = decode(texel, t.linear_light);

    let halo = halation_glow(src, uv, frame);
    for i in 0..3 {
        c[i] += halo[i];
    }

    if p.black_and_white {
        c = [dot3(c, FILM_LUMA); 3];
    } else {
        c = [
            apply_curve(c[0], p.red_curve),
            apply_curve(c[1], p.green_curve),
            apply_curve(c[2], p.blue_curve),
        ];
        c = apply_warmth(c, p.signed_warmth(), t);
        c = apply_saturation(c, p.saturation);
    }

    let strength = p.contrast_strength();
    c = c.map(|x| scurve(x, strength));

    c = apply_tone_split(c, p.highlights, p.shadows);

    let mut glow = bloom_glow(src, uv, frame);
    if monochrome {
        glow = [dot3(glow, FILM_LUMA); 3];
    }
    for i in 0..3 {
        c[i] += glow[i];
    }

    if p.grain_intensity > 0.0 {
        let gx = uv[0] * frame.resolution[0] / p.grain_size + frame.time * t.grain_drift;
        let gy = uv[1] * frame.resolution[1] / p.grain_size + frame.time * t.grain_drift;
        let amp = p.grain_intensity * t.grain_amplitude * grain_mask(dot3(c, REC601_LUMA), t);
        let n0 = grain::grain_sample(gx, gy, t.grain_octaves, 0);
        if monochrome {
            c = c.map(|x| x + n0 * amp);
        } else {
            let n1 = grain::grain_sample(gx, gy, t.grain_octaves, 1);
            let n2 = grain::grain_sample(gx, gy, t.grain_octaves, 2);
            c[0] += n0 * amp;
            c[1] += mix(n0, n1, t.grain_chroma) * amp;
            c[2] += mix(n0, n2, t.grain_chroma) * amp;
        }
    }

    c = apply_fade(c, p.fade, t);

    let v = vignette_factor(uv, p.vignette, t);
    c = c.map(|x| x * v);

    if t.linear_light {
        c = c.map(linear_to_srgb);
    }

    [c[0].clamp(0.0, 1.0), c[1].clamp(0.0, 1.0), c[2].clamp(0.0, 1.0), texel[3]]
}

/// Evaluate `shade` for every pixel of `src`, rows in parallel.
pub fn render_frame(src: &RgbaImage, frame: &FrameInputs) -> RgbaImage {
    let mut dst = RgbaImage::new(src.width(), src.height());
    render_into(src, &mut dst, frame);
    dst
}

/// Fill `dst` by stretching `src` over it, the way a full-surface quad does.
pub fn render_into(src: &RgbaImage, dst: &mut RgbaImage, frame: &FrameInputs) {
    let w = dst.width() as usize;
    let h = dst.height() as usize;
    if w == 0 || h == 0 || src.width() == 0 || src.height() == 0 {
        return;
    }

    let sampler = BilinearSampler::new(src);
    let stride = w * 4;

    dst.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let v = (y as f32 + 0.5) / h as f32;
            for x in 0..w {
                let u = (x as f32 + 0.5) / w as f32;
                let c = shade(&sampler, [u, v], frame);
                let pi = x * 4;
                for k in 0..4 {
                    row_out[pi + k] = (c[k] * 255.0).round().clamp(0.0, 255.0) as u8;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct Solid([f32; 4]);

    impl Sampler for Solid {
        fn sample(&self, _uv: [f32; 2]) -> [f32; 4] {
            self.0
        }
    }

    fn frame(params: FilmParameters) -> FrameInputs {
        FrameInputs::new(&params, &FilmTuning::default(), 64, 64, 0.0)
    }

    fn rgb(c: [f32; 4]) -> [f32; 3] {
        [c[0], c[1], c[2]]
    }

    fn close(a: [f32; 3], b: [f32; 3], eps: f32) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() <= eps)
    }

    #[test]
    fn neutral_parameters_are_identity() {
        let f = frame(FilmParameters::neutral());
        for px in [[0.1, 0.5, 0.9, 1.0], [0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 0.5], [0.73, 0.21, 0.44, 1.0]] {
            let out = shade(&Solid(px), [0.3, 0.8], &f);
            assert!(close(rgb(out), rgb(px), 1e-5), "{px:?} -> {out:?}");
            assert_eq!(out[3], px[3]);
        }
    }

    #[test]
    fn neutral_frame_round_trips_bytes() {
        let mut img = RgbaImage::new(5, 3);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 50) as u8, (y * 90) as u8, (x * 13 + y * 7) as u8, 255]);
        }
        let out = render_frame(&img, &FrameInputs::new(&FilmParameters::neutral(), &FilmTuning::default(), 5, 3, 4.2));
        assert_eq!(out, img);
    }

    #[test]
    fn more_warmth_is_redder() {
        let px = Solid([0.5, 0.45, 0.4, 1.0]);
        let mut last = 0.0;
        for w in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let f = frame(FilmParameters { warmth: w, ..FilmParameters::neutral() });
            let c = shade(&px, [0.5, 0.5], &f);
            let ratio = c[0] / c[2];
            assert!(ratio > last, "warmth {w}: {ratio} <= {last}");
            last = ratio;
        }
    }

    #[test]
    fn zero_saturation_is_film_luma() {
        let f = frame(FilmParameters { saturation: 0.0, ..FilmParameters::neutral() });
        let px = [0.8, 0.2, 0.35, 1.0];
        let out = shade(&Solid(px), [0.5, 0.5], &f);
        let l = dot3(rgb(px), FILM_LUMA);
        assert!(close(rgb(out), [l, l, l], 1e-5));
    }

    #[test]
    fn saturation_is_continuous_at_one() {
        let c = [0.7, 0.3, 0.2];
        assert!(close(apply_saturation(c, 0.9999), c, 1e-3));
        assert!(close(apply_saturation(c, 1.0001), c, 1e-3));
    }

    #[test]
    fn hsv_round_trip() {
        for c in [[0.2, 0.4, 0.9], [0.9, 0.1, 0.1], [0.5, 0.5, 0.5], [0.0, 0.7, 0.3]] {
            assert!(close(hsv_to_rgb(rgb_to_hsv(c)), c, 1e-5));
        }
    }

    #[test]
    fn contrast_steepens_midtones() {
        assert_eq!(scurve(0.5, 1.7), 0.5);
        assert!(scurve(0.6, 1.5) > scurve(0.6, 1.0));
        assert!(scurve(0.4, 1.5) < scurve(0.4, 1.0));
        assert!((scurve(0.37, 1.0) - 0.37).abs() < 1e-6);
    }

    #[test]
    fn fade_lifts_blacks() {
        let t = FilmTuning::default();
        assert!(apply_fade([0.0; 3], 0.5, &t)[0] > apply_fade([0.0; 3], 0.2, &t)[0]);
        assert_eq!(apply_fade([0.3; 3], 0.0, &t), [0.3; 3]);
    }

    #[test]
    fn vignette_darkens_edges_only_when_enabled() {
        let t = FilmTuning::default();
        assert_eq!(vignette_factor([0.0, 0.0], 0.0, &t), 1.0);
        assert_eq!(vignette_factor([0.5, 0.5], 1.0, &t), 1.0);
        let weak = vignette_factor([0.02, 0.02], 0.3, &t);
        let strong = vignette_factor([0.02, 0.02], 0.9, &t);
        assert!(strong < weak && weak < 1.0);
    }

    #[test]
    fn halation_is_red_and_vanishes_at_zero() {
        let bright = Solid([1.0, 1.0, 1.0, 1.0]);
        let on = frame(FilmParameters { halation: 0.8, ..FilmParameters::neutral() });
        let g = halation_glow(&bright, [0.5, 0.5], &on);
        assert!(g[0] > g[1] && g[1] > g[2] && g[2] > 0.0);

        let off = frame(FilmParameters::neutral());
        assert_eq!(halation_glow(&bright, [0.5, 0.5], &off), [0.0; 3]);

        let tiny = frame(FilmParameters { halation: 1e-5, ..FilmParameters::neutral() });
        assert!(halation_glow(&bright, [0.5, 0.5], &tiny).iter().all(|v| *v < 1e-4));
    }

    #[test]
    fn dark_neighbourhood_produces_no_glow() {
        let dark = Solid([0.3, 0.3, 0.3, 1.0]);
        let f = frame(FilmParameters { halation: 1.0, bloom: 1.0, ..FilmParameters::neutral() });
        assert_eq!(halation_glow(&dark, [0.5, 0.5], &f), [0.0; 3]);
        assert_eq!(bloom_glow(&dark, [0.5, 0.5], &f), [0.0; 3]);
    }

    #[test]
    fn monochrome_grain_keeps_channels_equal() {
        let f = FrameInputs::new(
            &FilmParameters { grain_intensity: 1.0, black_and_white: true, ..FilmParameters::neutral() },
            &FilmTuning::default(),
            32,
            32,
            1.5,
        );
        for i in 0..16 {
            let uv = [i as f32 / 16.0, 1.0 - i as f32 / 16.0];
            let c = shade(&Solid([0.9, 0.2, 0.4, 1.0]), uv, &f);
            assert_eq!(c[0], c[1]);
            assert_eq!(c[1], c[2]);
        }
    }

    #[test]
    fn grain_changes_with_time() {
        let params = FilmParameters { grain_intensity: 1.0, ..FilmParameters::neutral() };
        let t = FilmTuning::default();
        let a = shade(&Solid([0.5; 4]), [0.4, 0.4], &FrameInputs::new(&params, &t, 64, 64, 0.0));
        let b = shade(&Solid([0.5; 4]), [0.4, 0.4], &FrameInputs::new(&params, &t, 64, 64, 0.37));
        assert_ne!(a, b);
    }

    #[test]
    fn linear_light_keeps_neutral_identity() {
        let tuning = FilmTuning { linear_light: true, ..FilmTuning::default() };
        let f = FrameInputs::new(&FilmParameters::neutral(), &tuning, 8, 8, 0.0);
        let px = [0.25, 0.5, 0.75, 1.0];
        assert!(close(rgb(shade(&Solid(px), [0.5, 0.5], &f)), rgb(px), 1e-4));
    }

    #[test]
    fn curve_follows_toe_mid_shoulder() {
        let y = apply_curve(0.5, CurveTriple::new(1.2, 0.9, 1.0));
        assert!((y - 0.6051).abs() < 1e-3, "{y}");
        assert_eq!(apply_curve(0.5, CurveTriple::NEUTRAL), 0.5);
    }

    #[test]
    fn tone_split_targets_its_own_range() {
        assert!(apply_tone_split([0.9; 3], 0.8, 1.0)[0] < 0.9);
        assert_eq!(apply_tone_split([0.9; 3], 1.0, 0.5), [0.9; 3]);
        assert!(apply_tone_split([0.1; 3], 1.0, 1.3)[0] > 0.1);
        assert_eq!(apply_tone_split([0.1; 3], 1.5, 1.0), [0.1; 3]);
    }

    #[test]
    fn bloom_keeps_source_hue() {
        let bright = Solid([1.0, 0.9, 0.8, 1.0]);
        let f = frame(FilmParameters { bloom: 1.0, ..FilmParameters::neutral() });
        let g = bloom_glow(&bright, [0.5, 0.5], &f);
        assert!(g[2] > 0.0);
        assert!((g[1] / g[0] - 0.9).abs() < 1e-4);
        assert!((g[2] / g[0] - 0.8).abs() < 1e-4);
    }

    #[test]
    fn grain_mask_peaks_in_midtones() {
        let t = FilmTuning::default();
        assert_eq!(grain_mask(0.0, &t), 0.0);
        assert_eq!(grain_mask(1.0, &t), 0.0);
        let mid = grain_mask(0.5, &t);
        assert!(mid > grain_mask(0.2, &t) && mid > grain_mask(0.8, &t));
    }

    #[test]
    fn tuning_is_sanitized_per_frame() {
        let wild = FilmTuning {
            halation_samples: u32::MAX,
            bloom_samples: 0,
            grain_octaves: 500,
            vignette_inner: 1.5,
            bloom_gain: f32::NAN,
            ..FilmTuning::default()
        };
        let f = FrameInputs::new(&FilmParameters::neutral(), &wild, 8, 8, 0.0);
        assert_eq!(f.tuning.halation_samples, MAX_GLOW_SAMPLES);
        assert_eq!(f.tuning.bloom_samples, 1);
        assert_eq!(f.tuning.grain_octaves, MAX_GRAIN_OCTAVES);
        assert!(f.tuning.vignette_inner < 1.0);
        assert_eq!(f.tuning.bloom_gain, FilmTuning::default().bloom_gain);
        assert!(vignette_factor([0.0, 0.0], 1.0, &f.tuning).is_finite());
        assert_eq!(FilmTuning::default().sanitized(), FilmTuning::default());
    }

    #[test]
    fn tuning_deserializes_partially() {
        let t: FilmTuning = serde_json::from_str(r#"{ "halationThreshold": 0.75, "bloomSamples": 16 }"#).unwrap();
        assert_eq!(t.halation_threshold, 0.75);
        assert_eq!(t.bloom_samples, 16);
        assert_eq!(t.halation_samples, 16);
    }
}
