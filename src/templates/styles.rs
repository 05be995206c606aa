//! CSS for the papers listing and the notes editor.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized palette; light by default, dark when the user agent asks for it
   unless a papers-theme-* class on <body> overrides. */
:root {
    --base03: #002b36;
    --base02: #073642;
    --base01: #586e75;
    --base00: #657b83;
    --base0: #839496;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --yellow: #b58900;
    --orange: #cb4b16;
    --red: #dc322f;
    --blue: #268bd2;
    --cyan: #2aa198;
    --green: #859900;

    --bg: var(--base3);
    --fg: var(--base00);
    --muted: var(--base1);
    --border: var(--base2);
    --card-bg: #f5ecd5;
    --link: var(--blue);
    --accent: var(--base2);
}

@media (prefers-color-scheme: dark) {
    body:not(.papers-theme-light) {
        --bg: var(--base03);
        --fg: var(--base0);
        --muted: var(--base01);
        --border: var(--base02);
        --card-bg: var(--base02);
        --accent: var(--base02);
    }
}

body.papers-theme-dark {
    --bg: var(--base03);
    --fg: var(--base0);
    --muted: var(--base01);
    --border: var(--base02);
    --card-bg: var(--base02);
    --accent: var(--base02);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

.container { max-width: 1100px; margin: 0 auto; padding: 1rem; }

a { color: var(--link); text-decoration: none; }
a:hover { text-decoration: underline; }

h1, h2, h3 { font-weight: 600; margin-top: 1em; margin-bottom: 0.5em; }
h1 { font-size: 1.5rem; }

form.inline { display: inline; }

button, select, input, textarea {
    font-family: inherit;
    font-size: 0.9rem;
    color: var(--fg);
    background: var(--bg);
    border: 1px solid var(--border);
    border-radius: 4px;
    padding: 0.3rem 0.6rem;
}
button { cursor: pointer; background: var(--accent); }

.toolbar {
    display: flex;
    flex-wrap: wrap;
    gap: 0.5rem;
    align-items: center;
    padding: 0.5rem 0;
    border-bottom: 1px solid var(--border);
}
.toolbar .spacer { flex: 1; }

.filter-group { display: flex; flex-wrap: wrap; gap: 0.3rem; margin: 0.4rem 0; align-items: center; }
.filter-group .label { font-size: 0.8rem; color: var(--muted); margin-right: 0.3rem; }
.filter-tag[data-state="active"] { background: var(--blue); color: var(--base3); }
.toggle-active { background: var(--orange); color: var(--base3); }

#results-count { margin: 0.75rem 0; font-size: 0.9rem; }
#no-results { padding: 2rem; text-align: center; color: var(--muted); }

#papers-container {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(300px, 1fr));
    gap: 1rem;
}

.paper-card {
    background: var(--card-bg);
    border: 1px solid var(--border);
    border-radius: 6px;
    padding: 0.75rem 1rem;
    position: relative;
}
.paper-card.hidden { display: none; }
.paper-card.selected { outline: 2px solid var(--blue); }
.paper-card .paper-title { font-size: 1rem; margin: 0 0 0.3rem 0; }
.paper-card .meta { font-size: 0.8rem; color: var(--muted); }
.paper-card .categories { font-size: 0.75rem; margin-top: 0.3rem; }
.paper-card .category { background: var(--accent); border-radius: 3px; padding: 0.05rem 0.35rem; margin-right: 0.25rem; }
.paper-card .actions { margin-top: 0.5rem; display: flex; gap: 0.5rem; align-items: center; }
.paper-checkbox { position: absolute; top: 0.5rem; right: 0.5rem; }

.notes-badge { font-size: 0.75rem; }
.notes-rating { color: var(--yellow); font-size: 0.8rem; }

#selection-bar {
    position: sticky;
    bottom: 0;
    background: var(--bg);
    border-top: 1px solid var(--border);
    padding: 0.5rem 0;
    display: flex;
    gap: 0.5rem;
    align-items: center;
    flex-wrap: wrap;
}

.warning { padding: 1rem; border: 1px solid var(--orange); border-radius: 4px; margin: 1rem 0; }

.share-link { width: 100%; font-family: monospace; }

.notes-form { display: grid; gap: 0.6rem; margin-top: 1rem; }
.notes-form label { font-size: 0.8rem; color: var(--muted); display: block; }
.notes-form textarea { width: 100%; min-height: 6rem; font-family: monospace; }
.notes-form #paper-notes-text { min-height: 14rem; }
.notes-form .row { display: flex; gap: 1rem; flex-wrap: wrap; }
.notes-preview { border-top: 1px solid var(--border); margin-top: 1rem; padding-top: 0.5rem; }
#paper-notes-saved { font-size: 0.8rem; color: var(--muted); }
"#;
