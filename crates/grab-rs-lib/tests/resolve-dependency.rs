use grab_rs::dependency::build_descriptors;
use grab_rs::resolver::ResolutionError;
use grab_rs_test_utils::*;
use serde_json::json;

fn modules(engine: &grab_rs::GrabEngine) -> Vec<String> {
	engine.managed_dependencies().iter().map(|m| m.coordinate.to_string()).collect()
}

#[test]
fn resolve_transitive_closure() {
	init_logging();
	let repo = TestRepository::new("r1").expect("failed to create repository.");
	repo.publish("com.example", "lib", "1.0", &[PomDependency::new("com.example", "helper", "2.0")]).expect("failed to publish lib.");
	repo.publish("com.example", "helper", "2.0", &[]).expect("failed to publish helper.");

	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);
	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0", "transitive": true})), None)
		.expect("failed to grab lib.");

	assert_eq!(modules(&engine), ["com.example:lib:1.0", "com.example:helper:2.0"]);
	let urls = engine.load_path().urls();
	assert_eq!(urls.len(), 2);
	assert!(urls.iter().all(|u| u.to_file_path().unwrap().starts_with(local.path())));
}

#[test]
fn resolved_files_are_in_local_repository() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let descriptors = build_descriptors(&[record(json!({"group": "com.example", "module": "lib", "version": "1.0"}))], &[]).unwrap();
	let artifacts = engine.resolve(&descriptors).unwrap();
	assert_eq!(artifacts[0].local_file, local.path().join("com/example/lib/1.0/lib-1.0.jar"));
	assert_eq!(std::fs::read_to_string(&artifacts[0].local_file).unwrap(), "com.example:lib:1.0");
}

#[test]
fn intransitive_grab_resolves_only_named_artifact() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[PomDependency::new("com.example", "helper", "2.0")]).unwrap();
	repo.publish("com.example", "helper", "2.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let args = record(json!({"excludes": [{"group": "org.other", "module": "thing"}]}));
	engine.grab(&args, &[record(json!({"group": "com.example", "module": "lib", "version": "1.0", "transitive": false}))], None).unwrap();
	assert_eq!(modules(&engine), ["com.example:lib:1.0"]);
}

#[test]
fn excludes_remove_transitive_dependencies() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[PomDependency::new("com.example", "helper", "2.0"), PomDependency::new("com.example", "util", "1.0")]).unwrap();
	repo.publish("com.example", "helper", "2.0", &[]).unwrap();
	repo.publish("com.example", "util", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let args = record(json!({"excludes": [{"group": "com.example", "module": "helper"}]}));
	engine.grab(&args, &[record(json!({"group": "com.example", "module": "lib", "version": "1.0"}))], None).unwrap();
	assert_eq!(modules(&engine), ["com.example:lib:1.0", "com.example:util:1.0"]);
}

#[test]
fn descriptor_exclusions_apply_to_whole_subtree() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[PomDependency::new("com.example", "mid", "1.0").exclude("com.example", "leaf")]).unwrap();
	repo.publish("com.example", "mid", "1.0", &[PomDependency::new("com.example", "deep", "1.0")]).unwrap();
	repo.publish("com.example", "deep", "1.0", &[PomDependency::new("com.example", "leaf", "1.0")]).unwrap();
	repo.publish("com.example", "leaf", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None).unwrap();
	assert_eq!(modules(&engine), ["com.example:lib:1.0", "com.example:mid:1.0", "com.example:deep:1.0"]);
}

#[test]
fn test_provided_and_optional_dependencies_are_skipped() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[
		PomDependency::new("junit", "junit", "4.13").scope("test"),
		PomDependency::new("javax.servlet", "servlet-api", "2.5").scope("provided"),
		PomDependency::new("com.example", "extra", "1.0").optional(),
		PomDependency::new("com.example", "helper", "2.0"),
	]).unwrap();
	repo.publish("com.example", "helper", "2.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None).unwrap();
	assert_eq!(modules(&engine), ["com.example:lib:1.0", "com.example:helper:2.0"]);
}

#[test]
fn runtime_dependencies_are_not_on_compile_classpath() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[PomDependency::new("com.example", "driver", "1.0").scope("runtime")]).unwrap();
	repo.publish("com.example", "driver", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None).unwrap();
	assert_eq!(modules(&engine), ["com.example:lib:1.0"]);
}

#[test]
fn nearest_declaration_wins() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "a", "1.0", &[PomDependency::new("com.example", "b", "1.0")]).unwrap();
	repo.publish("com.example", "b", "1.0", &[PomDependency::new("com.example", "shared", "2.0")]).unwrap();
	repo.publish("com.example", "c", "1.0", &[PomDependency::new("com.example", "shared", "1.0")]).unwrap();
	repo.publish("com.example", "shared", "1.0", &[]).unwrap();
	repo.publish("com.example", "shared", "2.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab(&record(json!({})), &[
		record(json!({"group": "com.example", "module": "a", "version": "1.0"})),
		record(json!({"group": "com.example", "module": "c", "version": "1.0"})),
	], None).unwrap();
	assert_eq!(modules(&engine), ["com.example:a:1.0", "com.example:b:1.0", "com.example:c:1.0", "com.example:shared:1.0"]);
}

#[test]
fn compile_declaration_widens_runtime_winner() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "a", "1.0", &[PomDependency::new("com.example", "x", "1.0").scope("runtime")]).unwrap();
	repo.publish("com.example", "b", "1.0", &[PomDependency::new("com.example", "x", "1.0")]).unwrap();
	repo.publish("com.example", "x", "1.0", &[PomDependency::new("com.example", "y", "1.0")]).unwrap();
	repo.publish("com.example", "y", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab(&record(json!({})), &[
		record(json!({"group": "com.example", "module": "a", "version": "1.0"})),
		record(json!({"group": "com.example", "module": "b", "version": "1.0"})),
	], None).unwrap();
	assert_eq!(modules(&engine), ["com.example:a:1.0", "com.example:x:1.0", "com.example:y:1.0", "com.example:b:1.0"]);
}

#[test]
fn runtime_declaration_does_not_narrow_compile_winner() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "a", "1.0", &[PomDependency::new("com.example", "x", "1.0")]).unwrap();
	repo.publish("com.example", "b", "1.0", &[PomDependency::new("com.example", "x", "1.0").scope("runtime")]).unwrap();
	repo.publish("com.example", "x", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab(&record(json!({})), &[
		record(json!({"group": "com.example", "module": "a", "version": "1.0"})),
		record(json!({"group": "com.example", "module": "b", "version": "1.0"})),
	], None).unwrap();
	assert_eq!(modules(&engine), ["com.example:a:1.0", "com.example:x:1.0", "com.example:b:1.0"]);
}

#[test]
fn resolved_version_is_pinned_for_later_grabs() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[]).unwrap();
	repo.publish("com.example", "lib", "2.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let config = test_config(local.path());

	let (mut fresh, _) = test_engine(&config, vec![repo.repository().unwrap()]);
	let loose = build_descriptors(&[record(json!({"group": "com.example", "module": "lib", "version": "*"}))], &[]).unwrap();
	assert_eq!(fresh.resolve(&loose).unwrap()[0].coordinate.version(), "2.0");

	let (mut engine, _) = test_engine(&config, vec![repo.repository().unwrap()]);
	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None).unwrap();
	assert_eq!(engine.resolve(&loose).unwrap()[0].coordinate.version(), "1.0");
}

#[test]
fn pinned_version_overrides_transitive_declaration() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "helper", "2.0", &[]).unwrap();
	repo.publish("com.example", "helper", "3.0", &[]).unwrap();
	repo.publish("com.example", "app", "1.0", &[PomDependency::new("com.example", "helper", "3.0")]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "helper", "version": "2.0"})), None).unwrap();
	let app = build_descriptors(&[record(json!({"group": "com.example", "module": "app", "version": "1.0"}))], &[]).unwrap();
	let versions: Vec<String> = engine.resolve(&app).unwrap().iter().map(|a| a.coordinate.to_string()).collect();
	assert_eq!(versions, ["com.example:app:1.0", "com.example:helper:2.0"]);
}

#[test]
fn concrete_direct_version_ignores_pin() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[]).unwrap();
	repo.publish("com.example", "lib", "2.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None).unwrap();
	let exact = build_descriptors(&[record(json!({"group": "com.example", "module": "lib", "version": "2.0"}))], &[]).unwrap();
	assert_eq!(engine.resolve(&exact).unwrap()[0].coordinate.version(), "2.0");
}

#[test]
fn version_range_picks_highest_match() {
	let repo = TestRepository::new("r1").unwrap();
	for version in ["1.0", "1.5", "2.0"] {
		repo.publish("com.example", "lib", version, &[]).unwrap();
	}
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "[1.0,2.0)"})), None).unwrap();
	assert_eq!(modules(&engine), ["com.example:lib:1.5"]);
}

#[test]
fn failed_grab_leaves_managed_set_unchanged() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);
	engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None).unwrap();
	let before = engine.managed_dependencies().to_vec();

	let result = engine.grab(&record(json!({})), &[
		record(json!({"group": "com.example", "module": "lib", "version": "1.0"})),
		record(json!({"group": "com.example", "module": "nonexistent", "version": "1.0"})),
	], None);
	match result {
		Err(grab_rs::Error::DependencyResolutionFailed(ResolutionError::ArtifactNotFound { searched, .. })) => assert_eq!(searched, ["r1"]),
		other => panic!("unexpected result: {:?}", other),
	}
	assert_eq!(engine.managed_dependencies(), before.as_slice());
	assert_eq!(engine.load_path().urls().len(), 1);
}

#[test]
fn unknown_version_is_reported() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish("com.example", "lib", "1.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let result = engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "[5.0,)"})), None);
	assert!(matches!(result, Err(grab_rs::Error::DependencyResolutionFailed(ResolutionError::VersionNotFound { .. }))));
}

#[test]
fn missing_group_fails_before_any_repository_is_contacted() {
	let repo = TestRepository::new("r1").unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, contacts) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let result = engine.grab_single(&record(json!({"module": "lib", "version": "1.0"})), None);
	assert!(matches!(result, Err(grab_rs::Error::InvalidCoordinate(_))));
	assert!(!contacts.was_contacted());
}

#[test]
fn missing_descriptor_resolves_artifact_alone() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish_jar("com.example", "bare", "1.0").unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "bare", "version": "1.0"})), None).unwrap();
	assert_eq!(modules(&engine), ["com.example:bare:1.0"]);
}

#[test]
fn malformed_descriptor_fails() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish_pom("com.example", "broken", "1.0", "<project><artifactId>broken</project>").unwrap();
	repo.publish_jar("com.example", "broken", "1.0").unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let result = engine.grab_single(&record(json!({"group": "com.example", "module": "broken", "version": "1.0"})), None);
	assert!(matches!(result, Err(grab_rs::Error::DependencyResolutionFailed(ResolutionError::MalformedDescriptor { .. }))));
}

#[test]
fn parent_descriptor_supplies_managed_versions() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish_pom("com.example", "parent", "1", r#"<project>
		<groupId>com.example</groupId><artifactId>parent</artifactId><version>1</version><packaging>pom</packaging>
		<properties><helper.version>2.0</helper.version></properties>
		<dependencyManagement><dependencies>
			<dependency><groupId>com.example</groupId><artifactId>helper</artifactId><version>${helper.version}</version></dependency>
		</dependencies></dependencyManagement>
	</project>"#).unwrap();
	repo.publish_pom("com.example", "child", "1.0", r#"<project>
		<parent><groupId>com.example</groupId><artifactId>parent</artifactId><version>1</version></parent>
		<artifactId>child</artifactId><version>1.0</version>
		<dependencies><dependency><groupId>com.example</groupId><artifactId>helper</artifactId></dependency></dependencies>
	</project>"#).unwrap();
	repo.publish_jar("com.example", "child", "1.0").unwrap();
	repo.publish("com.example", "helper", "2.0", &[]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "child", "version": "1.0"})), None).unwrap();
	assert_eq!(modules(&engine), ["com.example:child:1.0", "com.example:helper:2.0"]);
}

#[test]
fn transitive_dependency_without_version_fails() {
	let repo = TestRepository::new("r1").unwrap();
	let mut helper = PomDependency::new("com.example", "helper", "0");
	helper.version = None;
	repo.publish("com.example", "lib", "1.0", &[helper]).unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	let result = engine.grab_single(&record(json!({"group": "com.example", "module": "lib", "version": "1.0"})), None);
	assert!(matches!(result, Err(grab_rs::Error::DependencyResolutionFailed(ResolutionError::MissingVersion { .. }))));
}

#[test]
fn ext_selects_packaging() {
	let repo = TestRepository::new("r1").unwrap();
	repo.publish_pom("com.example", "bundle", "1.0", "<project><groupId>com.example</groupId><artifactId>bundle</artifactId><version>1.0</version><packaging>zip</packaging></project>").unwrap();
	std::fs::write(repo.file_path("com.example", "bundle", "1.0", "zip"), b"zip").unwrap();
	let local = tempfile::tempdir().unwrap();
	let (mut engine, _) = test_engine(&test_config(local.path()), vec![repo.repository().unwrap()]);

	engine.grab_single(&record(json!({"group": "com.example", "module": "bundle", "version": "1.0", "ext": "zip"})), None).unwrap();
	assert!(engine.load_path().urls()[0].path().ends_with("bundle-1.0.zip"));
}
