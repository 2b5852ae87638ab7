use crate::{
    fieldspec,
    image::{self, ImageRef},
};

use super::{ExecuteInput, ExecuteOutput, ResourceSelector, RestoreItemAction};

/// Rewrites the container images of restored workloads to the image named by
/// the `imageshift.io/container-image` annotation, keeping each container's
/// original tag when the annotation does not pin one.
#[derive(Debug, Default)]
pub struct ChangeImageAction;

impl RestoreItemAction for ChangeImageAction {
    fn name(&self) -> &'static str {
        "imageshift/change-container-image"
    }

    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector {
            included_resources: vec![
                "deployments".into(),
                "statefulsets".into(),
                "cronjobs".into(),
            ],
            excluded_resources: Vec::new(),
        }
    }

    #[tracing::instrument(skip_all, name = "change_image", fields(item = %input.item.id()))]
    fn execute(&mut self, input: ExecuteInput) -> anyhow::Result<ExecuteOutput> {
        let mut item = input.item;

        let Some(target) = item.metadata()?.annotations.container_image else {
            return Ok(ExecuteOutput::new(item));
        };

        if target.is_empty() {
            tracing::warn!("image annotation is empty, leaving item unchanged");
            return Ok(ExecuteOutput::new(item));
        }

        let target = ImageRef::parse(&target);
        fieldspec::Builtin::get()
            .images
            .apply::<String>(&mut item, |image_ref| {
                let updated = image::rewrite(image_ref, &target);
                tracing::info!(from = %image_ref, to = %updated, "updating container image");
                *image_ref = updated;
                Ok(())
            })?;

        Ok(ExecuteOutput::new(item))
    }
}

#[cfg(test)]
mod tests {
    use crate::resource::Resource;

    use super::*;

    fn execute(yaml: &str) -> Resource {
        let item: Resource = serde_yaml::from_str(yaml).unwrap();
        ChangeImageAction
            .execute(ExecuteInput { item })
            .unwrap()
            .item
    }

    #[test]
    fn each_container_keeps_its_own_tag() {
        let out = execute(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  annotations:
    imageshift.io/container-image: registry.example.com/mirror/web
spec:
  template:
    spec:
      initContainers:
      - name: init
        image: ghcr.io/acme/web-init:1.4.0
      containers:
      - name: web
        image: ghcr.io/acme/web:1.4.0
      - name: proxy
        image: ghcr.io/acme/proxy:0.9.2
"#,
        );

        let containers = &out.root()["spec"]["template"]["spec"]["containers"];
        assert_eq!(
            containers[0]["image"],
            "registry.example.com/mirror/web:1.4.0"
        );
        assert_eq!(
            containers[1]["image"],
            "registry.example.com/mirror/web:0.9.2"
        );

        let init = &out.root()["spec"]["template"]["spec"]["initContainers"];
        assert_eq!(init[0]["image"], "registry.example.com/mirror/web:1.4.0");
    }

    #[test]
    fn tagged_annotation_overrides_every_tag() {
        let out = execute(
            r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: db
  annotations:
    imageshift.io/container-image: registry.example.com/mirror/db:2024.1
spec:
  template:
    spec:
      containers:
      - name: db
        image: postgres:16.3
"#,
        );

        let containers = &out.root()["spec"]["template"]["spec"]["containers"];
        assert_eq!(containers[0]["image"], "registry.example.com/mirror/db:2024.1");
    }

    #[test]
    fn cronjob_images_live_under_the_job_template() {
        let out = execute(
            r#"
apiVersion: batch/v1
kind: CronJob
metadata:
  name: report
  annotations:
    imageshift.io/container-image: registry.example.com/mirror/report
spec:
  schedule: "0 3 * * *"
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: OnFailure
          containers:
          - name: report
            image: ghcr.io/acme/report:7
"#,
        );

        let containers =
            &out.root()["spec"]["jobTemplate"]["spec"]["template"]["spec"]["containers"];
        assert_eq!(containers[0]["image"], "registry.example.com/mirror/report:7");
        assert_eq!(out.root()["spec"]["schedule"], "0 3 * * *");
    }

    #[test]
    fn missing_annotation_leaves_the_item_unchanged() {
        let yaml = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
      - name: web
        image: ghcr.io/acme/web:1.4.0
"#;
        let before: Resource = serde_yaml::from_str(yaml).unwrap();
        let after = execute(yaml);
        assert_eq!(before, after);
    }

    #[test]
    fn empty_annotation_leaves_the_item_unchanged() {
        let out = execute(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  annotations:
    imageshift.io/container-image: ""
spec:
  template:
    spec:
      containers:
      - name: web
        image: ghcr.io/acme/web:1.4.0
"#,
        );

        let containers = &out.root()["spec"]["template"]["spec"]["containers"];
        assert_eq!(containers[0]["image"], "ghcr.io/acme/web:1.4.0");
    }

    #[test]
    fn never_reports_in_progress_operations() {
        let mut action = ChangeImageAction;
        assert!(action.progress("op-1").unwrap().completed);
        action.cancel("op-1").unwrap();
    }

    #[test]
    fn selector_names_the_workload_kinds() {
        let selector = ChangeImageAction.applies_to();
        assert_eq!(
            selector.included_resources,
            ["deployments", "statefulsets", "cronjobs"]
        );
        assert!(selector.excluded_resources.is_empty());
    }
}
