/// GPU rendition of [`crate::evaluate`], written against the ShaderToy
/// `mainImage` entry point.
///
/// The renderer prepends a prelude that maps `iResolution` and `iTime` onto
/// its uniform block and appends the real `main`.
pub const PATTERN_SHADER_GLSL: &str = r"vec3 palette(float t, vec3 a, vec3 b, vec3 c, vec3 d) {
    return a + b * cos(6.28318 * (c * t + d));
}

void mainImage(out vec4 fragColor, in vec2 fragCoord) {
    vec2 uv = (fragCoord * 2.0 - iResolution.xy) / iResolution.y;
    vec2 ou = uv;
    vec3 finalColor = vec3(0.0);

    for (int i = 0; i < 3; i++) {
        uv = fract(uv * 1.5) - 0.5;
        float d = length(uv) * exp(-length(ou));
        vec3 col = palette(length(ou) + iTime * 0.4, vec3(0.2, 0.4, 0.01), vec3(0.5, 0.3, 0.5), vec3(0.3, 0.1, 0.11), vec3(0.263, 0.263, 0.263));
        d = sin(d * 8.0 + iTime) / 8.0;
        d = abs(d);
        d = 0.02 / max(d, 1.17549435e-38);
        finalColor += col * d;
    }

    fragColor = vec4(finalColor, 1.0);
}
";
