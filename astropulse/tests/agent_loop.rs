//! End-to-end tests for the reasoning loop: scripted model, canned tools.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use astropulse::{
    AgentConfig, CancellationToken, ChatCompletionClient, ChatMessage, ConversationStore,
    ModelError, Role, ScriptedChatClient, SolarAnalystAgent, Tool, ToolError, ToolRegistry,
    EXCEPTION_ACTION,
};

/// Records every argument bag it is invoked with and replies with a canned
/// JSON-encoded body, the way the real fetchers do.
struct CannedTool {
    name: &'static str,
    reply: Value,
    calls: Mutex<Vec<Value>>,
}

impl CannedTool {
    fn new(name: &'static str, reply: Value) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn recorded_calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for CannedTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "canned test tool"
    }

    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(args.clone());
        Ok(self.reply.clone())
    }
}

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "Radiometer"
    }

    fn description(&self) -> &str {
        "always faults"
    }

    async fn invoke(&self, _args: &Value) -> Result<Value, ToolError> {
        Err(ToolError::Execution("flare feed exploded".to_string()))
    }
}

/// Model client whose calls either answer instantly or hang far past any
/// test timeout.
enum Reply {
    Text(&'static str),
    Hang,
}

struct PatternedClient {
    script: Mutex<VecDeque<Reply>>,
}

impl PatternedClient {
    fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl ChatCompletionClient for PatternedClient {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ModelError::Api("hung call returned".to_string()))
            }
            None => Err(ModelError::Api("patterned client exhausted".to_string())),
        }
    }
}

fn test_config() -> AgentConfig {
    AgentConfig {
        api_key: "test-key".to_string(),
        max_iterations: 5,
        model_timeout: Duration::from_secs(5),
        tool_timeout: Duration::from_secs(1),
        max_memory_turns: 50,
        ..AgentConfig::default()
    }
}

fn build_agent(
    model: Arc<dyn ChatCompletionClient>,
    tools: Vec<Arc<dyn Tool>>,
    config: AgentConfig,
) -> SolarAnalystAgent {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool).unwrap();
    }
    let memory = Arc::new(ConversationStore::new(config.max_memory_turns));
    SolarAnalystAgent::new(config, model, registry, memory)
}

#[tokio::test]
async fn tool_call_then_final_answer() {
    let tool = CannedTool::new("Magnetometer", json!(r#"{"kp_index": 4.3}"#));
    let model = Arc::new(ScriptedChatClient::new([
        "Thought: need the Kp reading first.\nAction: Magnetometer\nAction Input: {\"days_back\": 3}",
        "Thought: I have enough.\nFinal Answer: Geomagnetic conditions are quiet.",
    ]));
    let agent = build_agent(model, vec![tool.clone()], test_config());

    let episode = agent.query("How quiet is it?", "t1").await;

    assert!(episode.is_success());
    assert_eq!(
        episode.final_answer.as_deref(),
        Some("Geomagnetic conditions are quiet.")
    );
    assert_eq!(episode.steps.len(), 1);
    let step = &episode.steps[0];
    assert_eq!(step.action, "Magnetometer");
    assert_eq!(step.input, json!({"days_back": 3}));
    // The JSON-encoded tool reply is decoded for the trace.
    assert_eq!(step.observation, json!({"kp_index": 4.3}));
    assert_eq!(tool.recorded_calls(), vec![json!({"days_back": 3})]);
}

#[tokio::test]
async fn several_tool_calls_record_in_order() {
    let first = CannedTool::new("Magnetometer", json!({"kp": 3}));
    let second = CannedTool::new("FlareLog", json!([{"classType": "C1.0"}]));
    let model = Arc::new(ScriptedChatClient::new([
        "Thought: kp first\nAction: Magnetometer\nAction Input: {}",
        "Thought: flares next\nAction: FlareLog\nAction Input: {\"days_back\": 7}",
        "Thought: done\nFinal Answer: Two readings gathered.",
    ]));
    let agent = build_agent(model, vec![first, second], test_config());

    let episode = agent.query("survey", "t2").await;

    assert!(episode.is_success());
    assert_eq!(episode.steps.len(), 2);
    assert_eq!(episode.steps[0].action, "Magnetometer");
    assert_eq!(episode.steps[1].action, "FlareLog");
    // A structured sequence passes through untouched for the trace.
    assert_eq!(episode.steps[1].observation, json!([{"classType": "C1.0"}]));
}

#[tokio::test]
async fn endless_actions_hit_the_iteration_limit() {
    let tool = CannedTool::new("Magnetometer", json!({"kp": 3}));
    let config = AgentConfig {
        max_iterations: 3,
        ..test_config()
    };
    let reply = "Thought: again\nAction: Magnetometer\nAction Input: {}";
    let model = Arc::new(ScriptedChatClient::new([reply, reply, reply]));
    let agent = build_agent(model, vec![tool], config);

    let episode = agent.query("loop forever", "t3").await;

    assert_eq!(episode.status, astropulse::EpisodeStatus::Failed);
    assert!(episode.final_answer.is_none());
    let error = episode.error.expect("failed episodes carry an error");
    assert!(error.contains("iteration limit exceeded (3"), "got: {error}");
    assert_eq!(episode.steps.len(), 3, "partial progress stays in the trace");
}

#[tokio::test]
async fn unknown_tool_is_a_recoverable_step() {
    let model = Arc::new(ScriptedChatClient::new([
        "Thought: try this\nAction: MagnetopauseSniffer\nAction Input: {}",
        "Thought: fall back to answering\nFinal Answer: No sniffer available.",
    ]));
    let agent = build_agent(model, vec![], test_config());

    let episode = agent.query("sniff", "t4").await;

    assert!(episode.is_success());
    assert_eq!(episode.steps.len(), 1);
    let step = &episode.steps[0];
    assert_eq!(step.action, EXCEPTION_ACTION);
    assert!(step.observation["error"]
        .as_str()
        .unwrap()
        .contains("unknown tool: MagnetopauseSniffer"));
}

#[tokio::test]
async fn tool_fault_is_a_recoverable_step() {
    let model = Arc::new(ScriptedChatClient::new([
        "Thought: read it\nAction: Radiometer\nAction Input: {}",
        "Thought: degraded mode\nFinal Answer: Instrument offline; no reading.",
    ]));
    let agent = build_agent(model, vec![Arc::new(FailingTool)], test_config());

    let episode = agent.query("read radiometer", "t5").await;

    assert!(episode.is_success());
    let step = &episode.steps[0];
    assert_eq!(step.action, EXCEPTION_ACTION);
    assert!(step.observation["error"]
        .as_str()
        .unwrap()
        .contains("flare feed exploded"));
}

#[tokio::test]
async fn malformed_reply_is_recovered_and_marked() {
    let model = Arc::new(ScriptedChatClient::new([
        "The sun is large and I have opinions about it.",
        "Thought: proper format now\nFinal Answer: Calm conditions.",
    ]));
    let agent = build_agent(model, vec![], test_config());

    let episode = agent.query("status", "t6").await;

    assert!(episode.is_success());
    assert_eq!(episode.steps.len(), 1);
    let observation = episode.steps[0].observation["error"].as_str().unwrap();
    assert!(observation.starts_with("Invalid Format"), "got: {observation}");
    // The malformed reply itself is preserved as the step's rationale.
    assert!(episode.steps[0].thought.contains("opinions"));
}

#[tokio::test]
async fn final_answer_is_truncated_at_the_marker() {
    let model = Arc::new(ScriptedChatClient::new([
        "Final Answer: Storm watch continues. Invalid Format: Missing 'Action:' after 'Thought:'",
    ]));
    let agent = build_agent(model, vec![], test_config());

    let episode = agent.query("status", "t7").await;

    assert_eq!(episode.final_answer.as_deref(), Some("Storm watch continues."));
}

#[tokio::test]
async fn relaxed_literal_arguments_reach_the_tool_as_data() {
    let tool = CannedTool::new("ImpactModel", json!({"impact_probability": "LOW"}));
    let model = Arc::new(ScriptedChatClient::new([
        "Thought: run the model\nAction: ImpactModel\nAction Input: {flare_class: 'X1.8', source_location: 'N24E63'}",
        "Thought: done\nFinal Answer: Likely miss.",
    ]));
    let agent = build_agent(model, vec![tool.clone()], test_config());

    let episode = agent.query("impact?", "t8").await;

    assert!(episode.is_success());
    assert_eq!(
        tool.recorded_calls(),
        vec![json!({"flare_class": "X1.8", "source_location": "N24E63"})]
    );
}

#[tokio::test]
async fn memory_collects_episode_pairs_in_order() {
    let model = Arc::new(ScriptedChatClient::new([
        "Final Answer: first answer",
        "Final Answer: second answer",
    ]));
    let agent = build_agent(model, vec![], test_config());

    agent.query("first question", "shared").await;
    agent.query("second question", "shared").await;

    let turns = agent.memory().session("shared").await.snapshot().await;
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].text, "first question");
    assert_eq!(turns[1].text, "first answer");
    assert_eq!(turns[2].text, "second question");
    assert_eq!(turns[3].text, "second answer");
}

#[tokio::test]
async fn remembered_turns_are_injected_into_later_prompts() {
    let model = Arc::new(ScriptedChatClient::new([
        "Final Answer: first answer",
        "Final Answer: second answer",
    ]));
    let mut registry = ToolRegistry::new();
    registry
        .register(CannedTool::new("Magnetometer", json!({"kp": 3})))
        .unwrap();
    let memory = Arc::new(ConversationStore::new(50));
    let agent = SolarAnalystAgent::new(test_config(), model.clone(), registry, memory);

    agent.query("first question", "s").await;
    agent.query("second question", "s").await;

    let prompts = model.recorded_prompts();
    assert_eq!(prompts.len(), 2);
    // The second episode sees the first one's turns between the system
    // message and its own question.
    let second = &prompts[1];
    assert_eq!(second.len(), 4);
    assert_eq!(second[1].content, "first question");
    assert_eq!(second[2].content, "first answer");
}

#[tokio::test]
async fn autonomous_check_runs_a_full_episode() {
    let tool = CannedTool::new("Magnetometer", json!({"kp": 5}));
    let model = Arc::new(ScriptedChatClient::new([
        "Thought: start with data\nAction: Magnetometer\nAction Input: {}",
        "Thought: summarize\nFinal Answer: 7-day outlook is moderate.",
    ]));
    let agent = build_agent(model.clone(), vec![tool], test_config());

    let episode = agent.autonomous_check("auto").await;

    assert!(episode.is_success());
    assert!(episode.query.contains("7-day solar activity analysis"));
    assert_eq!(episode.steps.len(), 1);
    // The self-directed prompt is remembered like any other query.
    let turns = agent.memory().session("auto").await.snapshot().await;
    assert_eq!(turns.len(), 2);
}

#[tokio::test]
async fn failed_episodes_leave_memory_untouched() {
    let model = Arc::new(ScriptedChatClient::new(Vec::<String>::new()));
    let agent = build_agent(model, vec![], test_config());

    let episode = agent.query("anyone home?", "quiet").await;

    assert_eq!(episode.status, astropulse::EpisodeStatus::Failed);
    assert!(agent.memory().session("quiet").await.is_empty().await);
}

#[tokio::test]
async fn pre_cancelled_token_fails_without_side_effects() {
    let model = Arc::new(ScriptedChatClient::new(["Final Answer: never delivered"]));
    let agent = build_agent(model, vec![], test_config());

    let token = CancellationToken::new();
    token.cancel();
    let episode = agent
        .query_with_cancellation("status", "c1", Some(token))
        .await;

    assert_eq!(episode.status, astropulse::EpisodeStatus::Failed);
    assert_eq!(episode.error.as_deref(), Some("episode cancelled"));
    assert!(agent.memory().session("c1").await.is_empty().await);
}

#[tokio::test]
async fn cancellation_interrupts_a_hanging_model_call() {
    let model = PatternedClient::new(vec![Reply::Hang]);
    let agent = build_agent(model, vec![], test_config());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let episode = agent
        .query_with_cancellation("status", "c2", Some(token))
        .await;
    assert_eq!(episode.error.as_deref(), Some("episode cancelled"));
}

#[tokio::test]
async fn first_call_timeout_aborts_the_episode() {
    let model = PatternedClient::new(vec![Reply::Hang]);
    let config = AgentConfig {
        model_timeout: Duration::from_millis(30),
        ..test_config()
    };
    let agent = build_agent(model, vec![], config);

    let episode = agent.query("status", "t9").await;

    assert_eq!(episode.status, astropulse::EpisodeStatus::Failed);
    let error = episode.error.unwrap();
    assert!(error.contains("first turn"), "got: {error}");
    assert!(episode.steps.is_empty());
}

#[tokio::test]
async fn later_call_timeout_consumes_one_iteration() {
    let tool = CannedTool::new("Magnetometer", json!({"kp": 2}));
    let model = PatternedClient::new(vec![
        Reply::Text("Thought: read\nAction: Magnetometer\nAction Input: {}"),
        Reply::Hang,
        Reply::Text("Thought: finally\nFinal Answer: Quiet."),
    ]);
    let config = AgentConfig {
        model_timeout: Duration::from_millis(30),
        ..test_config()
    };
    let agent = build_agent(model, vec![tool], config);

    let episode = agent.query("status", "t10").await;

    assert!(episode.is_success());
    assert_eq!(episode.steps.len(), 2);
    assert_eq!(episode.steps[0].action, "Magnetometer");
    assert_eq!(episode.steps[1].action, EXCEPTION_ACTION);
    assert!(episode.steps[1].observation["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}
