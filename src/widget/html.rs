use super::mixer_view::MIXER_CHANNELS;

fn channel_label(id: &str) -> String {
    id.to_uppercase()
}

fn get_strips_html() -> String {
    MIXER_CHANNELS
        .iter()
        .map(|channel| {
            let id = channel.id();
            format!(
                r#"<div class="channel" data-channel="{id}">
    <div class="channel-name">{label}</div>
    <div class="device-name" title="">&nbsp;</div>
    <div class="slider-wrap">
        <input class="vertical-slider" type="range" min="0" max="100" value="0">
    </div>
    <div class="device-vol">0%</div>
    <button class="mute-btn" title="Mute">&#128266;</button>
</div>"#,
                id = id,
                label = channel_label(id),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn get_widget_html() -> String {
    let strips = get_strips_html();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<style>
    :root {{
        --glass-bg: rgba(20, 22, 28, 0.55);
        --glass-border: rgba(255, 255, 255, 0.14);
        --text: #f2f4f8;
        --text-dim: rgba(242, 244, 248, 0.6);
        --accent: #ff6a00;
        --muted: rgba(255, 80, 80, 0.9);
    }}

    * {{ margin: 0; padding: 0; box-sizing: border-box; }}

    html, body {{
        width: 100%;
        height: 100%;
        overflow: hidden;
        background: transparent;
        font-family: 'Segoe UI', sans-serif;
        user-select: none;
        cursor: default;
    }}

    .mixer {{
        position: absolute;
        inset: 6px;
        display: flex;
        justify-content: space-between;
        gap: 6px;
        padding: 12px 14px;
        background: var(--glass-bg);
        border: 1px solid var(--glass-border);
        border-radius: 16px;
        backdrop-filter: blur(18px);
        -webkit-backdrop-filter: blur(18px);
        box-shadow: 0 8px 24px rgba(0, 0, 0, 0.35);
    }}

    .channel {{
        flex: 1;
        display: flex;
        flex-direction: column;
        align-items: center;
        gap: 6px;
        min-width: 0;
    }}

    .channel-name {{
        color: var(--text);
        font-size: 11px;
        font-weight: 600;
        letter-spacing: 0.08em;
    }}

    .device-name {{
        color: var(--text-dim);
        font-size: 9px;
        max-width: 100%;
        white-space: nowrap;
        overflow: hidden;
        text-overflow: ellipsis;
        height: 12px;
    }}

    .slider-wrap {{
        flex: 1;
        display: flex;
        align-items: center;
        justify-content: center;
        width: 100%;
    }}

    .vertical-slider {{
        -webkit-appearance: slider-vertical;
        writing-mode: vertical-lr;
        direction: rtl;
        width: 8px;
        height: 150px;
        accent-color: var(--accent);
        cursor: pointer;
    }}

    .device-vol {{
        color: var(--text);
        font-size: 11px;
        font-variant-numeric: tabular-nums;
    }}

    .mute-btn {{
        width: 28px;
        height: 28px;
        border: none;
        border-radius: 50%;
        background: rgba(255, 255, 255, 0.08);
        color: var(--text);
        font-size: 14px;
        cursor: pointer;
        transition: background 0.15s ease, color 0.15s ease;
    }}

    .mute-btn:hover {{ background: rgba(255, 255, 255, 0.16); }}
    .mute-btn.muted {{ color: var(--muted); }}
</style>
</head>
<body>
<div class="mixer" id="mixer">
{strips}
</div>
<script>
    let nextId = 1;

    function send(cmd, args) {{
        const msg = Object.assign({{ id: nextId++, cmd: cmd }}, args || {{}});
        window.ipc.postMessage(JSON.stringify(msg));
    }}

    function strip(channel) {{
        return document.querySelector('.channel[data-channel="' + channel + '"]');
    }}

    function setMuted(btn, muted) {{
        btn.classList.toggle('muted', muted);
        btn.innerHTML = muted ? '&#128263;' : '&#128266;';
    }}

    window.applyPatch = function(patch) {{
        const el = strip(patch.channel);
        if (!el) return;
        if (patch.kind === 'volume') {{
            el.querySelector('.vertical-slider').value = patch.percent;
            el.querySelector('.device-vol').textContent = patch.percent + '%';
        }} else if (patch.kind === 'muted') {{
            setMuted(el.querySelector('.mute-btn'), patch.muted);
        }} else if (patch.kind === 'deviceName') {{
            const name = el.querySelector('.device-name');
            name.textContent = patch.shortName;
            name.title = patch.fullName;
        }}
    }};

    window.onCommandResponse = function(resp) {{
        if (!resp.success && resp.error) {{
            console.warn('command ' + resp.id + ' failed: ' + resp.error);
        }}
    }};

    document.querySelectorAll('.channel').forEach(function(el) {{
        const channel = el.dataset.channel;
        const slider = el.querySelector('.vertical-slider');
        const vol = el.querySelector('.device-vol');
        const btn = el.querySelector('.mute-btn');

        const dragStart = function() {{ send('drag-start'); }};
        const dragEnd = function() {{ send('drag-end'); }};
        slider.addEventListener('mousedown', dragStart);
        slider.addEventListener('touchstart', dragStart);
        slider.addEventListener('mouseup', dragEnd);
        slider.addEventListener('touchend', dragEnd);
        slider.addEventListener('mouseleave', dragEnd);

        slider.addEventListener('input', function() {{
            const value = parseInt(slider.value, 10);
            vol.textContent = value + '%';
            send('set-volume', {{ channel: channel, volume: value }});
        }});

        btn.addEventListener('click', function() {{
            const muted = !btn.classList.contains('muted');
            setMuted(btn, muted);
            send('set-mute', {{ channel: channel, muted: muted }});
        }});
    }});

    // Dragging the glass background moves the window.
    document.getElementById('mixer').addEventListener('mousedown', function(e) {{
        if (e.button !== 0) return;
        if (e.target.closest('input, button')) return;
        send('start-move');
    }});

    document.addEventListener('contextmenu', function(e) {{ e.preventDefault(); }});
</script>
</body>
</html>"#,
        strips = strips
    )
}
