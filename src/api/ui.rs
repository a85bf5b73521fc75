// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedded single-page web UI for the caption demo

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Memory Caption Generator</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 640px; margin: 2rem auto; padding: 0 1rem; color: #222; }
  h1 { font-size: 1.5rem; }
  .field { margin: 1rem 0; }
  label { display: block; font-weight: 600; margin-bottom: 0.25rem; }
  input[type=text] { width: 100%; padding: 0.5rem; box-sizing: border-box; }
  button { padding: 0.5rem 1.25rem; font-size: 1rem; cursor: pointer; }
  button:disabled { cursor: not-allowed; opacity: 0.5; }
  #preview { max-width: 100%; margin-top: 0.5rem; display: none; }
  .panel { border: 1px solid #ccc; border-radius: 6px; padding: 1rem; margin-top: 1rem; display: none; }
  .panel.caption { background: #eef6ff; }
  .panel.error { background: #fdecec; border-color: #e0a0a0; }
  details { margin-top: 0.75rem; }
  summary { cursor: pointer; }
  .notice { color: #a15c00; display: none; }
</style>
</head>
<body>
<h1>📸 Memory Caption Generator</h1>
<p>Upload a photo, add a personal memory, and get a caption that blends both.</p>
<p class="notice" id="notice">The image model is unavailable; captioning is disabled.</p>

<div class="field">
  <label for="photo">Photo (JPG or PNG)</label>
  <input type="file" id="photo" accept=".jpg,.jpeg,.png">
  <img id="preview" alt="preview">
</div>

<div class="field">
  <label for="memory">Your memory of this moment</label>
  <input type="text" id="memory" value="My favourite moment.">
</div>

<button id="generate">Generate Caption</button>

<div class="panel caption" id="result">
  <strong>Caption</strong>
  <p id="caption"></p>
  <details>
    <summary>What the model saw</summary>
    <p id="description"></p>
  </details>
</div>

<div class="panel error" id="error"></div>

<script>
const photo = document.getElementById('photo');
const preview = document.getElementById('preview');
const generate = document.getElementById('generate');
const result = document.getElementById('result');
const errorPanel = document.getElementById('error');

fetch('/health').then(r => r.json()).then(h => {
  if (!h.describerAvailable) {
    generate.disabled = true;
    document.getElementById('notice').style.display = 'block';
  }
}).catch(() => {});

photo.addEventListener('change', () => {
  const file = photo.files[0];
  if (!file) { preview.style.display = 'none'; return; }
  preview.src = URL.createObjectURL(file);
  preview.style.display = 'block';
});

generate.addEventListener('click', async () => {
  result.style.display = 'none';
  errorPanel.style.display = 'none';
  const file = photo.files[0];
  if (!file) {
    errorPanel.textContent = 'Please choose a photo first.';
    errorPanel.style.display = 'block';
    return;
  }
  generate.disabled = true;
  generate.textContent = 'Generating...';
  try {
    const form = new FormData();
    form.append('photo', file);
    form.append('memory', document.getElementById('memory').value);
    const resp = await fetch('/v1/caption/upload', { method: 'POST', body: form });
    const body = await resp.json();
    if (!resp.ok) {
      errorPanel.textContent = body.message || 'Request failed.';
      errorPanel.style.display = 'block';
    } else {
      document.getElementById('caption').textContent = body.caption;
      document.getElementById('description').textContent = body.description;
      result.style.display = 'block';
    }
  } catch (e) {
    errorPanel.textContent = 'Could not reach the server.';
    errorPanel.style.display = 'block';
  } finally {
    generate.disabled = false;
    generate.textContent = 'Generate Caption';
  }
});
</script>
</body>
</html>
"#;
