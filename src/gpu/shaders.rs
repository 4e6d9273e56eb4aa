// ============================================================================
// GPU SHADERS — WGSL source for the film program, kept inline
// ============================================================================
//
// The fragment stage is a transliteration of `ops::film::shade`; any change to
// one side needs the same change on the other.  Uniform layout must match
// `gpu::pipeline::FilmUniforms` byte for byte (208 bytes).

/// Full-surface quad: interleaved `[x, y, u, v]` vertices, uv origin top-left.
pub const FILM_VERTEX_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}
"#;

pub const FILM_FRAGMENT_SHADER: &str = r#"
struct FilmUniforms {
    resolution: vec2<f32>,
    time: f32,
    linear_light: f32,
    grain: f32,
    grain_size: f32,
    warmth: f32,             // signed, 0 = neutral
    contrast: f32,           // S-curve strength, 1 = neutral
    saturation: f32,
    highlights: f32,
    shadows: f32,
    halation: f32,
    bloom: f32,
    vignette: f32,
    fade: f32,
    black_and_white: f32,
    red_curve: vec4<f32>,    // toe, mid, shoulder, unused
    green_curve: vec4<f32>,
    blue_curve: vec4<f32>,
    halation_tint: vec4<f32>, // rgb tint, w = gain
    halation_threshold: f32,
    halation_radius: f32,
    halation_samples: u32,
    bloom_threshold: f32,
    bloom_radius: f32,
    bloom_gain: f32,
    bloom_samples: u32,
    grain_octaves: u32,
    grain_amplitude: f32,
    grain_mask_exponent: f32,
    grain_mask_gain: f32,
    grain_chroma: f32,
    grain_drift: f32,
    warmth_red: f32,
    warmth_blue: f32,
    fade_lift: f32,
    vignette_strength: f32,
    vignette_inner: f32,
    monochrome: f32,
    _pad: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> u: FilmUniforms;
@group(0) @binding(1) var src_tex: texture_2d<f32>;
@group(0) @binding(2) var src_samp: sampler;

const FILM_LUMA: vec3<f32> = vec3<f32>(0.3, 0.59, 0.11);
const REC601_LUMA: vec3<f32> = vec3<f32>(0.299, 0.587, 0.114);
const TAU: f32 = 6.283185307;

// ---- Noise ----------------------------------------------------------------

fn hash_u32(x_in: u32) -> u32 {
    var x = x_in;
    x = x * 0x9E3779B9u;
    x = x ^ (x >> 16u);
    x = x * 0x85EBCA6Bu;
    x = x ^ (x >> 13u);
    x = x * 0xC2B2AE35u;
    x = x ^ (x >> 16u);
    return x;
}

fn lattice(x: u32, y: u32, seed: u32) -> f32 {
    let h = hash_u32(x * 374761393u + y * 668265263u + seed * 2246822519u);
    return f32(h & 0x00FFFFFFu) / 16777216.0;
}

fn value_noise(p: vec2<f32>, seed: u32) -> f32 {
    let i = floor(p);
    let f = p - i;
    let xi = bitcast<u32>(i32(i.x));
    let yi = bitcast<u32>(i32(i.y));
    let a = lattice(xi, yi, seed);
    let b = lattice(xi + 1u, yi, seed);
    let c = lattice(xi, yi + 1u, seed);
    let d = lattice(xi + 1u, yi + 1u, seed);
    let w = f * f * (3.0 - 2.0 * f);
    return a + (b - a) * w.x + (c - a) * w.y * (1.0 - w.x) + (d - b) * w.x * w.y;
}

fn grain_sample(p: vec2<f32>, seed: u32) -> f32 {
    var value = 0.0;
    var amplitude = 0.5;
    var frequency = 1.0;
    var total = 0.0;
    let octaves = max(u.grain_octaves, 1u);
    for (var o = 0u; o < octaves; o = o + 1u) {
        value = value + amplitude * value_noise(p * frequency, seed + o);
        total = total + amplitude;
        frequency = frequency * 2.0;
        amplitude = amplitude * 0.5;
    }
    return value / total * 2.0 - 1.0;
}

// ---- Transfer -------------------------------------------------------------

fn srgb_to_linear(c: f32) -> f32 {
    if (c <= 0.04045) {
        return c / 12.92;
    }
    return pow((c + 0.055) / 1.055, 2.4);
}

fn linear_to_srgb(c_in: f32) -> f32 {
    let c = max(c_in, 0.0);
    if (c <= 0.0031308) {
        return c * 12.92;
    }
    return 1.055 * pow(c, 1.0 / 2.4) - 0.055;
}

fn fetch(uv: vec2<f32>) -> vec3<f32> {
    let c = textureSampleLevel(src_tex, src_samp, uv, 0.0).rgb;
    if (u.linear_light > 0.5) {
        return vec3<f32>(srgb_to_linear(c.r), srgb_to_linear(c.g), srgb_to_linear(c.b));
    }
    return c;
}

// ---- Color shaping --------------------------------------------------------

fn apply_curve(x: f32, curve: vec4<f32>) -> f32 {
    if (all(curve.xyz == vec3<f32>(1.0))) {
        return x;
    }
    return pow(max(x, 0.0), 1.0 / curve.x) * curve.y + (1.0 - curve.y) * curve.z;
}

fn scurve(x_in: f32, strength: f32) -> f32 {
    let x = clamp(x_in, 0.0, 1.0);
    let s = strength - 1.0;
    return (x - 0.5) * (1.0 + s) / (1.0 + s * abs(x - 0.5) * 2.0) + 0.5;
}

fn wrap6(x: f32) -> f32 {
    return x - 6.0 * floor(x / 6.0);
}

fn rgb_to_hsv(c: vec3<f32>) -> vec3<f32> {
    let mx = max(max(c.r, c.g), c.b);
    let mn = min(min(c.r, c.g), c.b);
    let delta = mx - mn;
    var h = 0.0;
    if (delta > 0.0) {
        if (mx == c.r) {
            h = wrap6((c.g - c.b) / delta) / 6.0;
        } else if (mx == c.g) {
            h = ((c.b - c.r) / delta + 2.0) / 6.0;
        } else {
            h = ((c.r - c.g) / delta + 4.0) / 6.0;
        }
    }
    var s = 0.0;
    if (mx > 0.0) {
        s = delta / mx;
    }
    return vec3<f32>(h, s, mx);
}

fn hsv_to_rgb(hsv: vec3<f32>) -> vec3<f32> {
    let n = vec3<f32>(5.0, 3.0, 1.0) + vec3<f32>(hsv.x * 6.0);
    let k = n - 6.0 * floor(n / 6.0);
    let m = clamp(min(k, vec3<f32>(4.0) - k), vec3<f32>(0.0), vec3<f32>(1.0));
    return vec3<f32>(hsv.z) - hsv.z * hsv.y * m;
}

fn apply_saturation(c: vec3<f32>, s: f32) -> vec3<f32> {
    if (s == 1.0) {
        return c;
    }
    if (s < 1.0) {
        let l = dot(c, FILM_LUMA);
        return mix(vec3<f32>(l), c, max(s, 0.0));
    }
    var hsv = rgb_to_hsv(c);
    hsv.y = min(hsv.y * s, 1.0);
    return hsv_to_rgb(hsv);
}

fn apply_tone_split(c_in: vec3<f32>) -> vec3<f32> {
    let l = dot(c_in, REC601_LUMA);
    let hm = smoothstep(0.5, 1.0, l);
    let sm = 1.0 - smoothstep(0.0, 0.5, l);
    var c = mix(c_in, c_in * u.highlights, hm);
    c = mix(c, c * u.shadows, sm);
    return c;
}

fn grain_mask(luma: f32) -> f32 {
    let m = max(1.0 - abs(clamp(luma, 0.0, 1.0) * 2.0 - 1.0), 0.0);
    return pow(m, u.grain_mask_exponent) * u.grain_mask_gain;
}

fn vignette_factor(uv: vec2<f32>) -> f32 {
    let d = length((uv - vec2<f32>(0.5)) * 2.0) / sqrt(2.0);
    return 1.0 - u.vignette * u.vignette_strength * smoothstep(u.vignette_inner, 1.0, d);
}

// ---- Neighbourhood glows --------------------------------------------------

fn excess(v: f32, threshold: f32) -> f32 {
    return max((v - threshold) / max(1.0 - threshold, 1e-4), 0.0);
}

fn max3(c: vec3<f32>) -> f32 {
    return max(max(c.r, c.g), c.b);
}

fn halation_glow(uv: vec2<f32>) -> vec3<f32> {
    if (u.halation <= 0.0 || u.halation_samples == 0u) {
        return vec3<f32>(0.0);
    }
    let radius = u.halation_radius * u.halation;
    var acc = vec3<f32>(0.0);
    for (var i = 0u; i < u.halation_samples; i = i + 1u) {
        let angle = f32(i) / f32(u.halation_samples) * TAU;
        let dir = vec2<f32>(cos(angle), sin(angle));
        let inner = fetch(uv + dir * radius);
        let outer = fetch(uv + dir * radius * 2.0);
        acc = acc + inner * excess(max3(inner), u.halation_threshold);
        acc = acc + outer * excess(max3(outer), u.halation_threshold) * 0.5;
    }
    let glow = acc / (f32(u.halation_samples) * 1.5);
    return glow * u.halation_tint.rgb * (u.halation * u.halation_tint.w);
}

fn bloom_glow(uv: vec2<f32>) -> vec3<f32> {
    if (u.bloom <= 0.0 || u.bloom_samples == 0u) {
        return vec3<f32>(0.0);
    }
    var acc = vec3<f32>(0.0);
    for (var i = 0u; i < u.bloom_samples; i = i + 1u) {
        let angle = f32(i) / f32(u.bloom_samples) * TAU;
        let dir = vec2<f32>(cos(angle), sin(angle));
        let inner = fetch(uv + dir * u.bloom_radius);
        let outer = fetch(uv + dir * u.bloom_radius * 2.0);
        acc = acc + inner * excess(dot(inner, REC601_LUMA), u.bloom_threshold);
        acc = acc + outer * excess(dot(outer, REC601_LUMA), u.bloom_threshold) * 0.5;
    }
    let glow = acc / (f32(u.bloom_samples) * 1.5);
    return glow * (u.bloom * u.bloom_gain);
}

// ---- Pipeline -------------------------------------------------------------

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let uv = in.uv;
    let texel = textureSampleLevel(src_tex, src_samp, uv, 0.0);
    var c = fetch(uv);

    c = c + halation_glow(uv);

    if (u.black_and_white > 0.5) {
        c = vec3<f32>(dot(c, FILM_LUMA));
    } else {
        c = vec3<f32>(
            apply_curve(c.r, u.red_curve),
            apply_curve(c.g, u.green_curve),
            apply_curve(c.b, u.blue_curve),
        );
        c.r = c.r + u.warmth * u.warmth_red;
        c.b = c.b - u.warmth * u.warmth_blue;
        c = apply_saturation(c, u.saturation);
    }

    c = vec3<f32>(scurve(c.r, u.contrast), scurve(c.g, u.contrast), scurve(c.b, u.contrast));

    c = apply_tone_split(c);

    var glow = bloom_glow(uv);
    if (u.monochrome > 0.5) {
        glow = vec3<f32>(dot(glow, FILM_LUMA));
    }
    c = c + glow;

    if (u.grain > 0.0) {
        let p = uv * u.resolution / u.grain_size + vec2<f32>(u.time * u.grain_drift);
        let amp = u.grain * u.grain_amplitude * grain_mask(dot(c, REC601_LUMA));
        let n0 = grain_sample(p, 0u);
        if (u.monochrome > 0.5) {
            c = c + vec3<f32>(n0 * amp);
        } else {
            let n1 = grain_sample(p, 1u);
            let n2 = grain_sample(p, 2u);
            c = c + vec3<f32>(n0, mix(n0, n1, u.grain_chroma), mix(n0, n2, u.grain_chroma)) * amp;
        }
    }

    let lift = u.fade * u.fade_lift;
    c = c * (1.0 - lift) + vec3<f32>(lift);

    c = c * vignette_factor(uv);

    if (u.linear_light > 0.5) {
        c = vec3<f32>(linear_to_srgb(c.r), linear_to_srgb(c.g), linear_to_srgb(c.b));
    }

    return vec4<f32>(clamp(c, vec3<f32>(0.0), vec3<f32>(1.0)), texel.a);
}
"#;
