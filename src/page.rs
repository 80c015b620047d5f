//! The static page shell. All view content comes from `render` via the API.

pub fn index_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>EcoGuard</title>
    <style>
{css}
    </style>
</head>
<body>
    <header>
        <h1>&#127807; EcoGuard</h1>
        <span class="subtitle">Waste classification &amp; disease risk, powered by Gemini</span>
    </header>
    <main id="app"><p class="booting">Loading...</p></main>
    <script>
{js}
    </script>
</body>
</html>"#,
        css = CSS,
        js = JS,
    )
}

const CSS: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
    background: #f6f8f6;
    color: #1f2a1f;
    min-height: 100vh;
}
header {
    background: white;
    box-shadow: 0 2px 8px rgba(0,0,0,0.08);
    padding: 16px 32px;
    display: flex;
    align-items: baseline;
    gap: 16px;
}
header h1 { color: #15803d; font-size: 1.6em; }
.subtitle { color: #666; font-size: 0.9em; }
main { max-width: 1100px; margin: 0 auto; padding: 32px 16px; }
.toolbar { display: flex; justify-content: flex-end; min-height: 8px; margin-bottom: 16px; }
button {
    font: inherit;
    cursor: pointer;
    border: none;
    border-radius: 10px;
    padding: 10px 22px;
    font-weight: 600;
}
button:disabled { background: #9ca3af !important; cursor: not-allowed; }
.start-over, .primary { background: #16a34a; color: white; }
.start-over:hover, .primary:hover { background: #15803d; }
.secondary { background: #e5e7eb; color: #374151; }
.home { text-align: center; }
.home h2 { font-size: 2.2em; margin-bottom: 8px; }
.lead { color: #555; margin-bottom: 40px; }
.mode-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 28px; }
.mode-card {
    background: white;
    border: 1px solid #e5e7eb;
    border-radius: 18px;
    padding: 32px;
    box-shadow: 0 8px 24px rgba(0,0,0,0.08);
    text-align: center;
    transition: all 0.3s;
}
.mode-card:hover { transform: translateY(-4px); box-shadow: 0 16px 40px rgba(0,0,0,0.14); }
.mode-card .icon { font-size: 3.5em; display: block; margin-bottom: 12px; }
.mode-card h3 { font-size: 1.5em; margin-bottom: 8px; }
.mode-card p { color: #555; font-weight: normal; }
.analyzing h2 { text-align: center; font-size: 1.8em; margin-bottom: 20px; }
.panel, .card {
    background: white;
    border: 1px solid #e5e7eb;
    border-radius: 18px;
    padding: 28px;
    box-shadow: 0 8px 24px rgba(0,0,0,0.06);
}
.upload-area {
    display: block;
    border: 3px dashed #bbf7d0;
    border-radius: 14px;
    padding: 48px 20px;
    text-align: center;
    cursor: pointer;
    background: #f7fef9;
}
.upload-area .icon { font-size: 3em; display: block; }
.upload-text { color: #16a34a; font-weight: 600; font-size: 1.2em; display: block; margin: 8px 0; }
.upload-hint { color: #888; font-size: 0.85em; }
.upload-area input { display: none; }
.preview { text-align: center; }
figure img { max-width: 100%; max-height: 340px; border-radius: 10px; box-shadow: 0 4px 15px rgba(0,0,0,0.1); }
figcaption { color: #888; font-size: 0.8em; margin: 6px 0 18px; }
.actions { display: flex; justify-content: center; gap: 14px; }
.error { color: #dc2626; text-align: center; font-weight: 600; margin-top: 16px; }
.result { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 28px; align-items: start; }
.uploaded h2 { text-align: center; margin-bottom: 14px; }
.details { display: flex; flex-direction: column; gap: 20px; }
.headline { text-align: center; }
.waste-type { color: #15803d; font-size: 2em; }
.card h4 { font-size: 1.2em; margin-bottom: 10px; }
.card h4 .icon { margin-right: 10px; }
.card p { color: #4b5563; margin-bottom: 6px; }
.label { font-weight: 600; color: #374151 !important; margin-top: 10px; }
.recyclable { font-weight: 600; }
.risks li { list-style: none; margin-bottom: 10px; }
.risks .name { font-weight: 600; color: #1f2937; }
.small { font-size: 0.9em; }
.tips { padding-left: 20px; color: #4b5563; }
.disease h4 { color: #dc2626; font-size: 1.5em; }
.risk-level { font-size: 2.4em; font-weight: 800; }
.risk-high { color: #ef4444 !important; }
.risk-medium { color: #eab308 !important; }
.risk-low { color: #22c55e !important; }
.overlay {
    position: fixed;
    inset: 0;
    background: rgba(255,255,255,0.85);
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    z-index: 10;
    font-weight: 600;
}
.spinner {
    border: 4px solid #e5e7eb;
    border-top: 4px solid #16a34a;
    border-radius: 50%;
    width: 50px;
    height: 50px;
    animation: spin 1s linear infinite;
    margin-bottom: 16px;
}
@keyframes spin {
    0% { transform: rotate(0deg); }
    100% { transform: rotate(360deg); }
}
"#;

const JS: &str = r#"
const app = document.getElementById('app');
let sessionId = null;

async function call(method, path, body, headers) {
    const response = await fetch('/api/sessions/' + sessionId + path, { method, body, headers });
    if (!response.ok) {
        throw new Error('Request failed: ' + response.status);
    }
    app.innerHTML = await response.text();
}

function showOverlay(message) {
    const overlay = document.createElement('div');
    overlay.className = 'overlay';
    overlay.innerHTML = '<div class="spinner"></div><p></p>';
    overlay.querySelector('p').textContent = message;
    app.prepend(overlay);
}

async function start() {
    const response = await fetch('/api/sessions', { method: 'POST' });
    const created = await response.json();
    sessionId = created.session_id;
    await call('GET', '/view');
}

app.addEventListener('click', async (e) => {
    const target = e.target.closest('[data-action]');
    if (!target || target.disabled || target.dataset.action === 'upload') {
        return;
    }
    try {
        switch (target.dataset.action) {
            case 'mode':
                await call('POST', '/mode', JSON.stringify({ mode: target.dataset.mode }),
                    { 'Content-Type': 'application/json' });
                break;
            case 'change-image':
                await call('DELETE', '/image');
                break;
            case 'analyze':
                target.disabled = true;
                showOverlay(target.dataset.progress || 'Analyzing...');
                await call('POST', '/analyze');
                break;
            case 'reset':
                await call('POST', '/reset');
                break;
        }
    } catch (err) {
        console.error(err);
        await call('GET', '/view');
    }
});

app.addEventListener('change', async (e) => {
    if (e.target.dataset.action !== 'upload' || !e.target.files[0]) {
        return;
    }
    const form = new FormData();
    form.append('image', e.target.files[0]);
    try {
        await call('POST', '/image', form);
    } catch (err) {
        console.error(err);
        await call('GET', '/view');
    }
});

window.addEventListener('beforeunload', () => {
    if (sessionId) {
        fetch('/api/sessions/' + sessionId, { method: 'DELETE', keepalive: true });
    }
});

start().catch((err) => {
    app.innerHTML = '<p class="error"></p>';
    app.querySelector('.error').textContent = 'Could not start a session: ' + err.message;
});
"#;
