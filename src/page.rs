//! HTML rendering for the single-page UI. Nothing here touches the model.

use crate::decision::{Decision, Label};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt::Write as _;

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

const STYLE: &str = r#"
    body {
        background-color: #0E1117;
        color: #fafafa;
        font-family: 'Arial', sans-serif;
        margin: 0;
        padding: 40px 0;
    }
    main { width: 70%; margin: 0 auto; }
    h1 {
        color: #ffffff;
        font-weight: 800;
        text-align: center;
        margin-bottom: 0px;
        font-size: 3rem;
    }
    h3 {
        text-align: center;
        color: #a0a0a0;
        font-weight: 400;
        margin-bottom: 30px;
    }
    .uploader {
        padding: 30px;
        background-color: #1E1E1E;
        border: 2px dashed #4CAF50;
        border-radius: 20px;
        text-align: center;
    }
    .uploader button {
        margin-top: 15px;
        padding: 10px 30px;
        border: none;
        border-radius: 10px;
        background: #4CAF50;
        color: white;
        font-size: 1rem;
        cursor: pointer;
    }
    .columns { display: flex; gap: 40px; margin-top: 30px; }
    .columns > section { flex: 1; }
    .columns img { width: 100%; border-radius: 12px; }
    .result-container { display: flex; justify-content: center; margin-top: 10px; }
    .result-card {
        width: 100%;
        padding: 30px;
        border-radius: 20px;
        text-align: center;
        box-shadow: 0 10px 30px rgba(0,0,0,0.5);
        animation: slideUp 0.6s cubic-bezier(0.2, 0.8, 0.2, 1);
        color: white;
    }
    .danger-card {
        background: linear-gradient(135deg, #d31027 0%, #ea384d 100%);
        border: 3px solid #ff6b6b;
    }
    .safe-card {
        background: linear-gradient(135deg, #134E5E 0%, #71B280 100%);
        border: 3px solid #71B280;
    }
    .big-icon { font-size: 4rem; margin-bottom: 15px; text-shadow: 0 4px 8px rgba(0,0,0,0.3); }
    .status-text {
        font-size: 2.2rem;
        font-weight: 900;
        margin: 0;
        letter-spacing: 1px;
        text-shadow: 0 2px 4px rgba(0,0,0,0.4);
    }
    .conf-text { font-size: 1.4rem; font-weight: 500; margin-top: 10px; opacity: 0.95; color: #f0f0f0; }
    progress { width: 100%; height: 14px; accent-color: #4CAF50; }
    .error {
        background: #3b1219;
        border: 1px solid #ff6b6b;
        border-radius: 10px;
        padding: 15px 20px;
        color: #ffb3b3;
    }
    details { margin-top: 40px; color: #c0c0c0; }
    @keyframes slideUp {
        from { opacity: 0; transform: translateY(40px); }
        to { opacity: 1; transform: translateY(0); }
    }
"#;

/// What the page shows below the header.
#[derive(Debug)]
pub enum PageBody<'a> {
    /// The model could not be loaded; no upload form is offered.
    ModelUnavailable { model_file: &'a str },
    /// Fresh page with the upload form.
    Upload,
    /// An analysed upload.
    Result {
        image: &'a [u8],
        decision: &'a Decision,
    },
    /// A per-request failure, shown above the upload form.
    Error { message: &'a str },
}

struct CardStyle {
    status: &'static str,
    class: &'static str,
    icon: &'static str,
}

fn card_style(label: Label) -> CardStyle {
    match label {
        Label::Pothole => CardStyle {
            status: "POTHOLE DETECTED",
            class: "danger-card",
            icon: "\u{1F6A8}",
        },
        Label::Safe => CardStyle {
            status: "ROAD IS SAFE",
            class: "safe-card",
            icon: "\u{2705}",
        },
    }
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Inline `data:` URI so the uploaded image can be shown without storing it.
pub fn image_data_uri(image: &[u8]) -> String {
    let mime = match image::guess_format(image) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "application/octet-stream",
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(image))
}

fn upload_form(out: &mut String) {
    let accept = ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");
    let _ = write!(
        out,
        r#"<form class="uploader" action="/analyze" method="post" enctype="multipart/form-data">
    <input type="file" name="image" accept="{accept}" required>
    <br><button type="submit">Analyze road</button>
</form>"#
    );
}

fn result_section(out: &mut String, image: &[u8], decision: &Decision) {
    let style = card_style(decision.label);
    let _ = write!(
        out,
        r#"<hr>
<div class="columns">
    <section>
        <h4>&#128248; Input Feed</h4>
        <img src="{src}" alt="Uploaded road image">
    </section>
    <section>
        <h4>&#129504; AI Diagnosis</h4>
        <div class="result-container">
            <div class="result-card {class}">
                <div class="big-icon">{icon}</div>
                <p class="status-text">{status}</p>
                <p class="conf-text">Confidence: {confidence:.2}%</p>
            </div>
        </div>
        <p><strong>System Confidence</strong></p>
        <progress value="{progress}" max="100">{progress}%</progress>
    </section>
</div>"#,
        src = image_data_uri(image),
        class = style.class,
        icon = style.icon,
        status = style.status,
        confidence = decision.confidence,
        progress = decision.progress(),
    );
}

pub fn render_page(body: &PageBody<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>RoadGuard | AI Pothole Detector</title>
<style>{STYLE}</style>
</head>
<body>
<main>
<h1>RoadGuard AI</h1>
<h3>Real-Time Pothole Detection System</h3>
"#
    );

    match body {
        PageBody::ModelUnavailable { model_file } => {
            let _ = write!(
                out,
                r#"<div class="error">&#9888;&#65039; Model file '{}' not found.</div>"#,
                escape_html(model_file)
            );
        }
        PageBody::Upload => upload_form(&mut out),
        PageBody::Result { image, decision } => {
            upload_form(&mut out);
            result_section(&mut out, image, decision);
        }
        PageBody::Error { message } => {
            let _ = write!(out, r#"<div class="error">{}</div>"#, escape_html(message));
            upload_form(&mut out);
        }
    }

    out.push_str(
        r#"
<details>
<summary>&#8505;&#65039; Technical Details</summary>
<p><strong>Model:</strong> MobileNetV2 (Transfer Learning)<br>
<strong>Input Resolution:</strong> 224x224 RGB<br>
<strong>Training Accuracy:</strong> 93.57%<br>
<strong>Latency:</strong> &lt;100ms</p>
</details>
</main>
</body>
</html>
"#,
    );

    out
}
