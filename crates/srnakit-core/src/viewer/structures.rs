//! The multi-structure browser page.
//!
//! One entry per input file, selectable from a dropdown, with chain
//! visibility toggles, color schemes and interface highlighting. Chain
//! composition is computed here and embedded, so the page JavaScript only
//! renders it.

use super::html::{escape_html, script_safe_json};
use crate::core::models::chain::KindCounts;
use crate::core::models::structure::Structure;
use serde::Serialize;

/// Chain identifier plus its dominant composition label.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChainInfo {
    pub id: String,
    pub kind: String,
}

/// Computes per-chain composition labels from the first model.
pub fn chain_info(structure: &Structure) -> Vec<ChainInfo> {
    let Some(model) = structure.models.first() else {
        return Vec::new();
    };
    model
        .system
        .chains_ordered()
        .map(|(_, chain)| {
            let mut counts = KindCounts::default();
            for &residue_id in chain.residues() {
                if let Some(residue) = model.system.residue(residue_id) {
                    counts.record(residue.kind);
                }
            }
            ChainInfo {
                id: chain.id.to_string(),
                kind: counts.chain_kind().to_string(),
            }
        })
        .collect()
}

/// One embedded structure: source text plus precomputed chain labels.
#[derive(Debug, Clone, Serialize)]
pub struct StructureEntry {
    pub id: usize,
    pub name: String,
    pub format: String,
    pub text: String,
    pub chains: Vec<ChainInfo>,
}

impl StructureEntry {
    /// Builds an entry from the raw file text and its parsed form.
    pub fn new(id: usize, name: &str, format: &str, text: String, parsed: &Structure) -> Self {
        Self {
            id,
            name: name.to_string(),
            format: format.to_string(),
            text,
            chains: chain_info(parsed),
        }
    }
}

/// Renders the complete HTML page.
///
/// # Errors
///
/// Returns an error if the embedded payload cannot be serialized.
pub fn render_structures_page(
    entries: &[StructureEntry],
    title: &str,
) -> Result<String, serde_json::Error> {
    let payload = script_safe_json(&entries)?;
    Ok(PAGE_TEMPLATE
        .replace("__TITLE__", &escape_html(title))
        .replace("__MODELS__", &payload))
}

const PAGE_TEMPLATE: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>__TITLE__</title>
<style>
body{margin:0;font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,Cantarell,Noto Sans,sans-serif;background:#0b0f14;color:#e5e7eb}
header{display:flex;align-items:center;gap:12px;padding:10px 14px;border-bottom:1px solid #1f2937;background:#0e141b;position:sticky;top:0;z-index:10}
#viewer{width:100%;height:calc(100vh - 64px);background:#111827}
.row{display:flex;gap:10px;flex-wrap:wrap;align-items:center}
.group{display:flex;gap:6px;align-items:center;background:#111827;border:1px solid #1f2937;border-radius:12px;padding:6px 10px}
select, input[type=number]{background:#0b0f14;border:1px solid #1f2937;border-radius:10px;color:#e5e7eb;padding:6px 8px}
button{background:#1f2937;border:1px solid #374151;border-radius:10px;color:#e5e7eb;padding:6px 10px;cursor:pointer}
button:hover{filter:brightness(1.1)}
label{font-size:12px;opacity:.9}
.pill{background:#0b0f14;border:1px solid #1f2937;border-radius:999px;padding:4px 8px;font-size:12px}
.badge{padding:2px 6px;border-radius:8px;border:1px solid #374151;background:#0b0f14;font-size:11px;opacity:.9}
</style>
<script src="https://cdnjs.cloudflare.com/ajax/libs/3Dmol/2.3.0/3Dmol-min.min.js"></script>
</head>
<body>
<header class="row">
  <div class="group">
    <strong style="font-size:14px">__TITLE__</strong>
    <span class="badge" id="chainInfo"></span>
  </div>
  <div class="group">
    <label>Model</label>
    <select id="modelSelect"></select>
    <button id="resetCamera">Reset view</button>
  </div>
  <div class="group" id="chainToggles"></div>
  <div class="group">
    <label>Color</label>
    <select id="colorScheme">
      <option value="chain">Chain</option>
      <option value="ss">Secondary structure</option>
      <option value="bfactor">B-factor</option>
    </select>
    <button id="applyColor">Apply</button>
  </div>
  <div class="group">
    <label>Interface &#8491;</label>
    <input id="ifaceDist" type="number" min="2" max="12" step="0.5" value="5.0"/>
    <label>from</label>
    <select id="ifaceFrom"></select>
    <label>to</label>
    <select id="ifaceTo"></select>
    <button id="highlightInterface">Highlight</button>
  </div>
  <div class="group">
    <button id="snapshotBtn">Snapshot PNG</button>
    <button id="downloadBtn">Download</button>
  </div>
</header>
<div id="viewer"></div>

<script>
const MODELS = __MODELS__;

const NUC = new Set(['A','U','G','C','DA','DT','DG','DC','I','DI','5MC','PSU']);

let viewer = null;
let currentModelId = null;
let modelObj = null;

function initViewer() {
  viewer = $3Dmol.createViewer("viewer", { backgroundColor: "#111827", antialias: true });
  const sel = document.getElementById('modelSelect');
  MODELS.forEach(m => {
    const opt = document.createElement('option');
    opt.value = m.id;
    opt.textContent = m.name;
    sel.appendChild(opt);
  });
  sel.addEventListener('change', () => loadModel(parseInt(sel.value)));
  loadModel(MODELS[0].id);

  document.getElementById('resetCamera').onclick = () => { viewer.zoomTo(); viewer.render(); };
  document.getElementById('applyColor').onclick = applyColor;
  document.getElementById('highlightInterface').onclick = highlightInterface;
  document.getElementById('snapshotBtn').onclick = snapshotPNG;
  document.getElementById('downloadBtn').onclick = downloadCurrent;
}

function loadModel(id) {
  currentModelId = id;
  const m = MODELS.find(x => x.id === id);
  viewer.clear();
  modelObj = viewer.addModel(m.text, m.format);
  viewer.setStyle({resn: Array.from(NUC)}, {stick:{}});
  viewer.setStyle({not: {resn: Array.from(NUC)}}, {cartoon:{}});
  buildChainUI(m);
  applyColor();
  viewer.zoomTo();
  viewer.render();
}

function buildChainUI(m) {
  const div = document.getElementById('chainToggles');
  div.innerHTML = '';
  const fromSel = document.getElementById('ifaceFrom');
  const toSel = document.getElementById('ifaceTo');
  fromSel.innerHTML = ''; toSel.innerHTML = '';
  const info = document.getElementById('chainInfo');
  info.textContent = m.chains.map(c => c.id+':'+c.kind).join('  ');

  m.chains.forEach(c => {
    const lbl = document.createElement('label');
    lbl.className = 'pill';
    const cb = document.createElement('input');
    cb.type='checkbox'; cb.checked = true; cb.dataset.chain=c.id;
    cb.onchange = () => toggleChain(c.id, cb.checked);
    lbl.appendChild(cb);
    lbl.appendChild(document.createTextNode(' Chain '+c.id+' ('+c.kind+')'));
    div.appendChild(lbl);

    const opt1 = document.createElement('option'); opt1.value=c.id; opt1.text=c.id;
    const opt2 = document.createElement('option'); opt2.value=c.id; opt2.text=c.id;
    fromSel.appendChild(opt1); toSel.appendChild(opt2);
  });
  if (m.chains.length>=2) toSel.selectedIndex = 1;
}

function toggleChain(chain, visible) {
  if (!modelObj) return;
  if (visible) {
    viewer.setStyle({chain}, {});
    viewer.setStyle({chain, resn: Array.from(NUC)}, {stick:{}});
    viewer.setStyle({chain, not: {resn: Array.from(NUC)}}, {cartoon:{}});
  } else {
    viewer.setStyle({chain}, {});
  }
  viewer.render();
}

function applyColor() {
  const scheme = document.getElementById('colorScheme').value;
  if (!modelObj) return;
  viewer.setStyle({}, {});
  viewer.setStyle({resn: Array.from(NUC)}, {stick:{}});
  let styleProtein = {cartoon:{}};
  if (scheme === 'chain') styleProtein = {cartoon:{colorscheme:'chain'}};
  else if (scheme === 'ss') styleProtein = {cartoon:{colorscheme:'ssPyMOL'}};
  else if (scheme === 'bfactor') styleProtein = {cartoon:{colorscheme:{prop:'b',gradient:'roygb'}}};
  viewer.setStyle({not: {resn: Array.from(NUC)}}, styleProtein);
  viewer.render();
}

function highlightInterface() {
  const dist = parseFloat(document.getElementById('ifaceDist').value || '5');
  const fromC = document.getElementById('ifaceFrom').value;
  const toC = document.getElementById('ifaceTo').value;
  if (!modelObj || !fromC || !toC || fromC===toC) return;
  applyColor();
  const selFromNear = {within: dist, sel: {chain: toC}, chain: fromC};
  const selToNear = {within: dist, sel: {chain: fromC}, chain: toC};
  viewer.setStyle(selFromNear, {stick:{radius:0.2}});
  viewer.setStyle(selToNear, {stick:{radius:0.2}});
  viewer.render();
}

function snapshotPNG() {
  if (!viewer) return;
  const a = document.createElement('a');
  a.href = viewer.pngURI();
  a.download = 'structure.png';
  a.click();
}

function downloadCurrent() {
  const m = MODELS.find(x => x.id === currentModelId);
  if (!m) return;
  const blob = new Blob([m.text], {type:'text/plain'});
  const url = URL.createObjectURL(blob);
  const a = document.createElement('a');
  a.href = url;
  a.download = m.name || ('structure.' + m.format);
  a.click();
  setTimeout(()=> URL.revokeObjectURL(url), 1000);
}

document.addEventListener('DOMContentLoaded', initViewer);
</script>
</body>
</html>
"##;
