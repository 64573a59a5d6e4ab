//! The embedded chat page.

pub(super) const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Therapy Chatbot</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 960px; padding: 24px; }
  .center-header { display: flex; justify-content: center; font-size: 2em; font-weight: bold; margin-bottom: 30px; }
  .chat-container { border-radius: 10px; padding: 10px; max-height: 500px; overflow-y: auto; }
  .chat-message { margin: 5px 0; padding: 8px 12px; border-radius: 8px; white-space: pre-wrap; }
  .user-message { background-color: #8f9779; color: white; text-align: right; }
  .bot-message { background-color: #f0f0f5; color: #333; text-align: left; }
  .pending { opacity: 0.7; }
  .notice { color: #a33; margin: 8px 0; min-height: 1.2em; }
  form { display: flex; gap: 10px; align-items: flex-end; }
  label { display: flex; flex-direction: column; flex-grow: 1; gap: 4px; }
  input { padding: 10px; border-radius: 10px; border: 2px solid #ccc; }
  button { padding: 10px 20px; border-radius: 10px; border: none; background-color: #4caf50; color: white; cursor: pointer; }
  button:hover { background-color: #45a049; }
  button:disabled { background-color: #999; cursor: wait; }
</style>
</head>
<body>
<div class="center-header">Dr. Dizan Therapy Chatbot</div>
<div id="chat" class="chat-container"></div>
<div id="notice" class="notice"></div>
<form id="ask">
  <label>What is bothering you?
    <input id="question" name="question" autocomplete="off">
  </label>
  <button id="send" type="submit">Send</button>
</form>
<script>
const KEY = "dizan.session";
const chat = document.getElementById("chat");
const notice = document.getElementById("notice");
const input = document.getElementById("question");
const send = document.getElementById("send");

async function createSession() {
  const res = await fetch("/api/sessions", { method: "POST" });
  const body = await res.json();
  sessionStorage.setItem(KEY, body.session_id);
  return body.session_id;
}

async function sessionId() {
  return sessionStorage.getItem(KEY) || createSession();
}

async function refresh() {
  const id = await sessionId();
  const res = await fetch(`/api/sessions/${id}/transcript.html`);
  if (res.status === 404) {
    sessionStorage.removeItem(KEY);
    await createSession();
    chat.innerHTML = "";
    return;
  }
  chat.innerHTML = await res.text();
  chat.scrollTop = chat.scrollHeight;
}

function parseEvent(block) {
  let name = "message";
  const data = [];
  for (const line of block.split("\n")) {
    if (line.startsWith("event:")) name = line.slice(6).trim();
    else if (line.startsWith("data:")) data.push(line.slice(5).replace(/^ /, ""));
  }
  return { name, data: data.length ? JSON.parse(data.join("\n")) : null };
}

async function submit(question) {
  const id = await sessionId();
  const res = await fetch(`/api/sessions/${id}/submit`, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ question }),
  });
  if (res.status === 404) {
    sessionStorage.removeItem(KEY);
    notice.textContent = "Your session expired. A new one has been started.";
    return;
  }
  if (!res.ok) {
    const body = await res.json().catch(() => ({}));
    notice.textContent = body.error || `Request failed (${res.status}).`;
    return;
  }

  const asked = document.createElement("div");
  asked.className = "chat-message user-message pending";
  asked.textContent = `Patient: ${question}`;
  chat.appendChild(asked);

  const pending = document.createElement("div");
  pending.className = "chat-message bot-message pending";
  pending.textContent = "Bot: ";
  chat.appendChild(pending);

  const reader = res.body.getReader();
  const decoder = new TextDecoder();
  let buffer = "";
  for (;;) {
    const { value, done } = await reader.read();
    if (done) break;
    buffer += decoder.decode(value, { stream: true }).replace(/\r\n/g, "\n");
    let split;
    while ((split = buffer.indexOf("\n\n")) >= 0) {
      const block = buffer.slice(0, split);
      buffer = buffer.slice(split + 2);
      const event = parseEvent(block);
      if (event.name === "fragment") {
        pending.textContent += event.data.text;
        chat.scrollTop = chat.scrollHeight;
      } else if (event.name === "done") {
        chat.innerHTML = event.data.html;
      } else if (event.name === "error") {
        notice.textContent = event.data.message;
      }
    }
  }
}

document.getElementById("ask").addEventListener("submit", async (e) => {
  e.preventDefault();
  const question = input.value;
  if (!question.trim()) return;
  send.disabled = true;
  notice.textContent = "";
  try {
    await submit(question);
    input.value = "";
  } catch (err) {
    notice.textContent = "Could not reach the server. Please try again.";
  } finally {
    send.disabled = false;
    await refresh().catch(() => {});
    input.focus();
  }
});

refresh().catch(() => {});
</script>
</body>
</html>
"##;
