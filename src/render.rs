//! Server-side rendering of a session snapshot into the HTML fragment the
//! page shell swaps into `#app`.
//!
//! Everything here is a pure function of its input. Buttons carry
//! `data-action` attributes which the shell's script turns into API calls.

use std::fmt::Write as _;

use crate::schema::{AnalysisMode, AnalysisResult, DiseasePredictionResult, WasteClassificationResult};
use crate::session::{SessionSnapshot, View};
use crate::upload::UploadedImage;

pub fn render_session(snapshot: &SessionSnapshot) -> String {
    let body = match snapshot.view {
        View::Home => render_home(),
        View::Analyzing => render_analyzing(snapshot),
        View::Result => render_result(snapshot),
    };

    let start_over = if snapshot.view == View::Home {
        ""
    } else {
        r#"<button class="start-over" data-action="reset">Start Over</button>"#
    };

    format!(
        r#"<div class="session" data-view="{view}" data-mode="{mode}" data-busy="{busy}">
{overlay}<div class="toolbar">{start_over}</div>
{body}
</div>"#,
        view = view_name(snapshot.view),
        mode = snapshot.mode.map(mode_wire).unwrap_or(""),
        busy = snapshot.busy,
        overlay = render_overlay(snapshot),
        start_over = start_over,
        body = body,
    )
}

fn view_name(view: View) -> &'static str {
    match view {
        View::Home => "HOME",
        View::Analyzing => "ANALYZING",
        View::Result => "RESULT",
    }
}

fn render_overlay(snapshot: &SessionSnapshot) -> String {
    if !snapshot.busy {
        return String::new();
    }
    let message = snapshot
        .progress_message
        .as_deref()
        .unwrap_or("Working...");
    format!(
        r#"<div class="overlay"><div class="spinner"></div><p>{}</p></div>
"#,
        escape(message)
    )
}

fn render_home() -> String {
    format!(
        r#"<section class="home">
    <h2>Smart Waste &amp; Health Protection</h2>
    <p class="lead">Upload an image to classify waste or predict potential health risks from improper disposal.</p>
    <div class="mode-grid">
        {waste}
        {disease}
    </div>
</section>"#,
        waste = mode_card(
            AnalysisMode::Waste,
            "&#128465;",
            "Identify waste type and get suggestions for recycling, reuse, and safe disposal."
        ),
        disease = mode_card(
            AnalysisMode::Disease,
            "&#128137;",
            "Analyze waste dumps or drainage to predict potential diseases and learn prevention tips."
        ),
    )
}

fn mode_card(mode: AnalysisMode, icon: &str, description: &str) -> String {
    format!(
        r#"<button class="mode-card" data-action="mode" data-mode="{wire}">
            <span class="icon">{icon}</span>
            <h3>{title}</h3>
            <p>{description}</p>
        </button>"#,
        wire = mode_wire(mode),
        icon = icon,
        title = mode.title(),
        description = description,
    )
}

fn mode_wire(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Waste => "WASTE",
        AnalysisMode::Disease => "DISEASE",
    }
}

fn render_analyzing(snapshot: &SessionSnapshot) -> String {
    let title = snapshot.mode.map(|m| m.title()).unwrap_or("Analysis");

    let inner = match &snapshot.image {
        None => r#"<label class="upload-area" for="file-upload">
            <span class="icon">&#9729;</span>
            <span class="upload-text">Upload an image</span>
            <input id="file-upload" name="image" type="file" accept="image/*" data-action="upload">
            <span class="upload-hint">PNG, JPG, GIF up to 2MB</span>
        </label>"#
            .to_string(),
        Some(image) => format!(
            r#"<div class="preview">
            {img}
            <div class="actions">
                <button class="secondary" data-action="change-image"{disabled}>Change Image</button>
                <button class="primary" data-action="analyze" data-progress="{progress}"{disabled}>Analyze Now</button>
            </div>
        </div>"#,
            img = preview_img(image, "Upload preview"),
            progress = escape(
                snapshot
                    .mode
                    .map(|m| m.progress_message())
                    .unwrap_or("Analyzing...")
            ),
            disabled = if snapshot.busy { " disabled" } else { "" },
        ),
    };

    let error = match &snapshot.error {
        Some(message) => format!(r#"<p class="error">{}</p>"#, escape(message)),
        None => String::new(),
    };

    format!(
        r#"<section class="analyzing">
    <h2>{title}</h2>
    <div class="panel">
        {inner}
        {error}
    </div>
</section>"#,
        title = title,
        inner = inner,
        error = error,
    )
}

fn preview_img(image: &UploadedImage, alt: &str) -> String {
    format!(
        r#"<figure><img src="{src}" alt="{alt}"><figcaption>{w}&times;{h} &middot; {kb} KB</figcaption></figure>"#,
        src = escape(&image.preview),
        alt = alt,
        w = image.width,
        h = image.height,
        kb = image.size_bytes.div_ceil(1024),
    )
}

fn render_result(snapshot: &SessionSnapshot) -> String {
    let image = snapshot
        .image
        .as_ref()
        .map(|img| preview_img(img, "Analyzed content"))
        .unwrap_or_default();

    let details = match &snapshot.result {
        Some(AnalysisResult::Waste(waste)) => render_waste(waste),
        Some(AnalysisResult::Disease(disease)) => render_disease(disease),
        None => String::new(),
    };

    format!(
        r#"<section class="result">
    <div class="panel uploaded">
        <h2>Uploaded Image</h2>
        {image}
    </div>
    <div class="details">
{details}
    </div>
</section>"#,
        image = image,
        details = details,
    )
}

fn info_card(icon: &str, title: &str, body: &str) -> String {
    format!(
        r#"<div class="card"><h4><span class="icon">{icon}</span>{title}</h4>{body}</div>"#,
        icon = icon,
        title = title,
        body = body,
    )
}

pub fn render_waste(result: &WasteClassificationResult) -> String {
    let recyclable = if result.recycling.possible {
        r#"<p class="recyclable yes">&#9989; Recyclable</p>"#
    } else {
        r#"<p class="recyclable no">&#10060; Not easily recyclable</p>"#
    };

    let mut risks = String::new();
    for risk in &result.health_risks {
        let _ = write!(
            risks,
            r#"<li><p class="name">{}</p><p class="small">{}</p></li>"#,
            escape(&risk.name),
            escape(&risk.description)
        );
    }

    let mut html = format!(
        r#"<div class="card headline"><h3 class="waste-type">{}</h3></div>"#,
        escape(&result.waste_type)
    );
    html.push_str(&info_card(
        "&#9851;",
        "Recycling &amp; Reuse",
        &format!(
            r#"{recyclable}<p>{instructions}</p><p class="label">Reuse Ideas:</p><p>{reuse}</p>"#,
            recyclable = recyclable,
            instructions = escape(&result.recycling.instructions),
            reuse = escape(&result.reuse),
        ),
    ));
    html.push_str(&info_card(
        "&#128465;",
        "Proper Disposal",
        &format!("<p>{}</p>", escape(&result.disposal)),
    ));
    html.push_str(&info_card(
        "&#127807;",
        "Environmental Impact",
        &format!("<p>{}</p>", escape(&result.environmental_impact)),
    ));
    html.push_str(&info_card(
        "&#9888;",
        "Health Risks",
        &format!(r#"<ul class="risks">{}</ul>"#, risks),
    ));
    html
}

pub fn render_disease(result: &DiseasePredictionResult) -> String {
    let level = result.overall_risk_level;
    let mut html = format!(
        r#"<div class="card headline"><h3>Overall Risk Level</h3><p class="risk-level {class}">{label}</p></div>"#,
        class = level.css_class(),
        label = level.label(),
    );

    for disease in &result.predicted_diseases {
        let tips: String = disease
            .prevention_tips
            .iter()
            .map(|tip| format!("<li>{}</li>", escape(tip)))
            .collect();
        let _ = write!(
            html,
            r#"<div class="card disease"><h4>{name}</h4><p class="label">Cause:</p><p>{cause}</p><p class="label">Prevention Tips:</p><ul class="tips">{tips}</ul></div>"#,
            name = escape(&disease.name),
            cause = escape(&disease.cause),
            tips = tips,
        );
    }
    html
}

/// Minimal HTML text/attribute escaping.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
